use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JournalError;

/// Declares a closed tag vocabulary: the enum, its display labels and a
/// strict `FromStr` that rejects anything outside the list.
macro_rules! tag_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = JournalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|tag| tag.label().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| {
                        JournalError::InvalidTrade(format!("unknown {} '{}'", $kind, trimmed))
                    })
            }
        }
    };
}

tag_vocabulary! {
    /// Trading setup the position was taken on.
    Setup, "setup" {
        Zone => "Zone",
        Crusher => "Crusher",
        Sniper => "Sniper",
        TugOfWar => "Tug Of War",
        Tc => "TC",
        Hy => "HY",
        Ifn => "IFN",
        Rev => "REV",
        Tf => "TF",
        Ddv => "DDV",
        Other => "Other",
    }
}

tag_vocabulary! {
    /// How the entry and exit compared to the trading plan.
    EntryExitQuality, "entry/exit quality" {
        AsPlanned => "As Planned",
        TooEarly => "Too Early",
        TooLate => "Too Late",
        NotInPlan => "Not In Plan",
        BrokeRules => "Broke Rules",
        StopTooTight => "Stop to tight",
        First30Min => "First 30 min",
        DidntCheckNews => "Didn't Check News",
    }
}

tag_vocabulary! {
    Emotion, "emotion" {
        ByTheRules => "By The Rules",
        Fear => "Fear",
        Hope => "Hope",
        Greed => "Greed",
        Fomo => "FOMO",
        Bored => "Bored",
        Tired => "Tired",
        Distracted => "Distracted",
    }
}

impl EntryExitQuality {
    /// +1 when the trade went as planned, -1 for every deviation.
    pub fn score(&self) -> i32 {
        match self {
            EntryExitQuality::AsPlanned => 1,
            _ => -1,
        }
    }
}

impl Emotion {
    pub fn score(&self) -> i32 {
        match self {
            Emotion::ByTheRules => 1,
            _ => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse_back() {
        for setup in Setup::ALL {
            assert_eq!(setup.label().parse::<Setup>().unwrap(), *setup);
        }
        for quality in EntryExitQuality::ALL {
            assert_eq!(quality.label().parse::<EntryExitQuality>().unwrap(), *quality);
        }
        for emotion in Emotion::ALL {
            assert_eq!(emotion.label().parse::<Emotion>().unwrap(), *emotion);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("tug of war".parse::<Setup>().unwrap(), Setup::TugOfWar);
        assert_eq!(" fomo ".parse::<Emotion>().unwrap(), Emotion::Fomo);
    }

    #[test]
    fn test_unknown_tag_fails_fast() {
        let err = "Revenge".parse::<Emotion>().unwrap_err();
        assert!(matches!(err, JournalError::InvalidTrade(_)));
        assert!(err.to_string().contains("emotion"));
    }

    #[test]
    fn test_scores() {
        assert_eq!(EntryExitQuality::AsPlanned.score(), 1);
        assert_eq!(EntryExitQuality::DidntCheckNews.score(), -1);
        assert_eq!(Emotion::ByTheRules.score(), 1);
        assert_eq!(Emotion::Greed.score(), -1);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&EntryExitQuality::DidntCheckNews).unwrap();
        assert_eq!(json, "\"Didn't Check News\"");
        let parsed: Setup = serde_json::from_str("\"Tug Of War\"").unwrap();
        assert_eq!(parsed, Setup::TugOfWar);
    }
}
