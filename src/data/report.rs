use std::fmt;

/// Files written by one `deploy`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployReport {
    /// Images in the unlabeled pool at the working-directory root.
    pub pool: usize,
    /// Example images inside label directories.
    pub examples: usize,
    pub cancelled: bool,
}

/// Outcome of one `register`: files matched to rows and files that were not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterReport {
    pub success: usize,
    pub failure: usize,
    pub cancelled: bool,
}

impl RegisterReport {
    pub fn as_tuple(&self) -> (usize, usize) {
        (self.success, self.failure)
    }
}

impl fmt::Display for RegisterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registered: {}, failed: {}", self.success, self.failure)?;
        if self.cancelled {
            f.write_str(" (cancelled, nothing saved)")?;
        }
        Ok(())
    }
}
