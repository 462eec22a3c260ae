/// Decision returned for one admission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    /// Admitted, with notes surfaced to the requester.
    AllowWithWarnings(Vec<String>),
    Deny(String),
}

impl Verdict {
    /// `Allow` when there is nothing to warn about, `AllowWithWarnings` otherwise.
    pub fn allow_with(warnings: Vec<String>) -> Self {
        if warnings.is_empty() {
            Verdict::Allow
        } else {
            Verdict::AllowWithWarnings(warnings)
        }
    }

    pub fn is_allowed(&self) -> bool {
        !matches!(self, Verdict::Deny(_))
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Verdict::AllowWithWarnings(warnings) => warnings,
            _ => &[],
        }
    }

    /// Denial reason, if denied.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Deny(reason) => Some(reason),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Allow => write!(f, "allowed"),
            Verdict::AllowWithWarnings(warnings) => {
                write!(f, "allowed with warnings: {}", warnings.join("; "))
            }
            Verdict::Deny(reason) => write!(f, "denied: {}", reason),
        }
    }
}
