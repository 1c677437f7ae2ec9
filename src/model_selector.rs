use crate::config::{ModelTiers, Thresholds};
use crate::request::StyleFlags;

/// Which model variant an invocation talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    /// Fast, cheap tier for short or simple prompts.
    Light,
    /// More capable tier for longer prompts.
    Capable,
    /// Explicit `--model` value, passed through untouched.
    Override(String),
}

impl ModelChoice {
    pub fn id<'a>(&'a self, tiers: &'a ModelTiers) -> &'a str {
        match self {
            Self::Light => &tiers.light,
            Self::Capable => &tiers.capable,
            Self::Override(model) => model,
        }
    }

    pub fn tier_name(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Capable => "capable",
            Self::Override(_) => "override",
        }
    }
}

/// Picks a model for `prompt`.
///
/// An override always wins and is not validated here; an unknown id is
/// reported by the API. `--short` requests go to the light tier since the
/// answer is capped anyway, whether or not `--concise` is also set. Everything
/// else is decided on word count alone.
pub fn select_model(
    prompt: &str,
    model_override: Option<&str>,
    flags: StyleFlags,
    thresholds: &Thresholds,
) -> ModelChoice {
    if let Some(model) = model_override.filter(|model| !model.is_empty()) {
        return ModelChoice::Override(model.to_string());
    }

    if flags.short {
        return ModelChoice::Light;
    }

    if prompt.split_whitespace().count() < thresholds.short_prompt_words {
        ModelChoice::Light
    } else {
        ModelChoice::Capable
    }
}

#[cfg(test)]
mod tests {
    use super::{ModelChoice, select_model};
    use crate::config::{ModelTiers, Thresholds};
    use crate::request::StyleFlags;

    const CONCISE: StyleFlags = StyleFlags {
        concise: true,
        short: false,
    };
    const SHORT: StyleFlags = StyleFlags {
        concise: false,
        short: true,
    };

    fn words(count: usize) -> String {
        vec!["word"; count].join(" ")
    }

    #[test]
    fn short_prompt_selects_light_tier() {
        let thresholds = Thresholds::default();
        let choice = select_model("What is 2+2?", None, StyleFlags::default(), &thresholds);
        assert_eq!(choice, ModelChoice::Light);
    }

    #[test]
    fn threshold_boundary_switches_to_capable_tier() {
        let thresholds = Thresholds {
            short_prompt_words: 5,
            short_response_chars: 600,
        };
        for count in 0..5 {
            assert_eq!(
                select_model(&words(count), None, StyleFlags::default(), &thresholds),
                ModelChoice::Light,
                "{count} words should stay on the light tier"
            );
        }
        for count in 5..12 {
            assert_eq!(
                select_model(&words(count), None, CONCISE, &thresholds),
                ModelChoice::Capable,
                "{count} words should move to the capable tier"
            );
        }
    }

    #[test]
    fn override_is_returned_verbatim_regardless_of_length() {
        let thresholds = Thresholds::default();
        for prompt in ["hi".to_string(), words(200)] {
            let choice = select_model(
                &prompt,
                Some(" not-a-real-model "),
                StyleFlags::default(),
                &thresholds,
            );
            assert_eq!(
                choice,
                ModelChoice::Override(" not-a-real-model ".to_string())
            );
        }
    }

    #[test]
    fn short_style_prefers_light_tier_for_long_prompts() {
        let thresholds = Thresholds::default();
        let choice = select_model(&words(80), None, SHORT, &thresholds);
        assert_eq!(choice, ModelChoice::Light);
    }

    #[test]
    fn short_wins_model_selection_even_with_concise() {
        let thresholds = Thresholds::default();
        let both = StyleFlags {
            concise: true,
            short: true,
        };
        let choice = select_model(&words(40), None, both, &thresholds);
        assert_eq!(choice, ModelChoice::Light);
    }

    #[test]
    fn id_resolves_tiers_against_configuration() {
        let tiers = ModelTiers {
            light: "small".to_string(),
            capable: "big".to_string(),
        };
        assert_eq!(ModelChoice::Light.id(&tiers), "small");
        assert_eq!(ModelChoice::Capable.id(&tiers), "big");
        assert_eq!(
            ModelChoice::Override("custom".to_string()).id(&tiers),
            "custom"
        );
    }
}
