use crate::collapse_ws;

/// `SBMJOB`: run a command in a batch job. The inner command is passed
/// through verbatim; `parameters` carries any extra SBMJOB keywords the
/// operator wants (JOBQ, JOBD, ...).
#[derive(Debug, Clone)]
pub struct Sbmjob {
    cmd: String,
    parameters: String,
}

impl Sbmjob {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            parameters: String::new(),
        }
    }

    pub fn parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        if self.cmd.trim().is_empty() {
            anyhow::bail!("SBMJOB requires a command to submit");
        }
        Ok(collapse_ws(&format!(
            "QSYS/SBMJOB CMD({}) {}",
            self.cmd.trim(),
            self.parameters
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_without_parameters() {
        let cmd = Sbmjob::new("CRTLIB LIB(TESTLIB)").render().unwrap();
        assert_eq!(cmd, "QSYS/SBMJOB CMD(CRTLIB LIB(TESTLIB))");
    }

    #[test]
    fn renders_with_parameters() {
        let cmd = Sbmjob::new("WRKSRVAGT TYPE(*UAK)")
            .parameters("JOBQ(QSYS/QSYSNOMAX)")
            .render()
            .unwrap();
        assert_eq!(
            cmd,
            "QSYS/SBMJOB CMD(WRKSRVAGT TYPE(*UAK)) JOBQ(QSYS/QSYSNOMAX)"
        );
    }

    #[test]
    fn rejects_empty_command() {
        assert!(Sbmjob::new("  ").render().is_err());
    }
}
