use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A topic tag sent alongside every message so the service picks the right tutor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    /// Physics.
    Physics,

    /// Chemistry.
    Chemistry,

    /// Mathematics, the fallback subject.
    #[default]
    Maths,
}

impl Subject {
    /// All subjects in resolution priority order.
    pub const ALL: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Maths];

    /// Resolves the subject from the label of the active tab.
    ///
    /// Matching is a case-insensitive substring test against `physics`, then
    /// `chemistry`, then `math`; a missing tab or a label matching none of
    /// them resolves to [`Subject::Maths`].
    ///
    /// ```
    /// use tutorius::Subject;
    ///
    /// assert_eq!(Subject::resolve(Some("Physics")), Subject::Physics);
    /// assert_eq!(Subject::resolve(Some("Biology")), Subject::Maths);
    /// assert_eq!(Subject::resolve(None), Subject::Maths);
    /// ```
    pub fn resolve(active_tab_label: Option<&str>) -> Subject {
        let Some(label) = active_tab_label else {
            return Subject::Maths;
        };
        let label = label.to_lowercase();
        Subject::ALL
            .into_iter()
            .find(|subject| label.contains(subject.keyword()))
            .unwrap_or(Subject::Maths)
    }

    /// The keyword matched against tab labels.
    pub fn keyword(&self) -> &'static str {
        match self {
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Maths => "math",
        }
    }

    /// The label shown on this subject's tab.
    pub fn tab_label(&self) -> &'static str {
        match self {
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Maths => "Mathematics",
        }
    }

    /// Sample questions offered as one-click examples for this subject.
    pub fn sample_questions(&self) -> &'static [&'static str] {
        match self {
            Subject::Physics => &[
                "Why does a ball thrown upward come back down?",
                "What is electric current and how does it flow?",
                "Why do we feel hot when we rub our hands together?",
                "What makes a magnet attract iron?",
                "Why does light bend when it enters water?",
            ],
            Subject::Chemistry => &[
                "What is a mole in chemistry and why is it important?",
                "Can you explain the difference between an ionic and a covalent bond?",
                "What is pH and how is it calculated?",
                "How does a catalyst work in a chemical reaction?",
                "What's the difference between an acid and a base?",
            ],
            Subject::Maths => &[
                "What is a derivative and why is it useful?",
                "Can you explain the Pythagorean theorem with an example?",
                "What are imaginary numbers and where are they used?",
                "How does integration work? I don't get it.",
                "What's the difference between permutation and combination?",
            ],
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Physics => write!(f, "physics"),
            Subject::Chemistry => write!(f, "chemistry"),
            Subject::Maths => write!(f, "maths"),
        }
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "physics" => Ok(Subject::Physics),
            "chemistry" => Ok(Subject::Chemistry),
            "math" | "maths" | "mathematics" => Ok(Subject::Maths),
            _ => Err(format!(
                "Invalid subject: {}. Valid options: physics, chemistry, maths",
                s
            )),
        }
    }
}
