use super::{Invocation, ToolRunner};
use crate::config::EmulatorArtifacts;
use crate::errors::HarnessError;
use crate::model::{TestCase, Tool};
use std::time::Duration;

/// Enables taint interception inside the patched emulator.
pub const QTE_ENABLE_VAR: &str = "AFL_USE_QTE";
/// Enables the sanitizer runtime inside the emulator.
pub const QASAN_ENABLE_VAR: &str = "AFL_USE_QASAN";

/// Runs the artifact inside an emulator binary: `<binary> <artifact>`, with a
/// tool-specific switch set to `1` in the child environment.
#[derive(Debug, Clone)]
pub struct EmulatorRunner {
    tool: Tool,
    artifacts: EmulatorArtifacts,
    enable_var: &'static str,
    timeout: Duration,
}

impl EmulatorRunner {
    pub fn taint_engine(artifacts: EmulatorArtifacts, timeout: Duration) -> Result<Self, HarnessError> {
        Self::checked(Tool::Qte, QTE_ENABLE_VAR, artifacts, timeout)
    }

    pub fn sanitizer_emulator(
        artifacts: EmulatorArtifacts,
        timeout: Duration,
    ) -> Result<Self, HarnessError> {
        Self::checked(Tool::Qasan, QASAN_ENABLE_VAR, artifacts, timeout)
    }

    fn checked(
        tool: Tool,
        enable_var: &'static str,
        artifacts: EmulatorArtifacts,
        timeout: Duration,
    ) -> Result<Self, HarnessError> {
        artifacts.verify(tool)?;
        tracing::info!(
            event = "runner_ready",
            tool = %tool,
            binary = %artifacts.binary.display(),
            library = %artifacts.library.display()
        );
        Ok(Self {
            tool,
            artifacts,
            enable_var,
            timeout,
        })
    }
}

impl ToolRunner for EmulatorRunner {
    fn tool(&self) -> Tool {
        self.tool
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn invocation(&self, tc: &TestCase) -> Invocation {
        Invocation {
            program: self.artifacts.binary.clone(),
            args: vec![tc.file_path.clone().into_os_string()],
            env: vec![(self.enable_var.to_string(), "1".to_string())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ArtifactKind;
    use crate::model::GroundTruth;
    use std::path::PathBuf;

    fn artifacts(dir: &std::path::Path) -> EmulatorArtifacts {
        let bin = dir.join("qemu");
        let lib = dir.join("lib.so");
        std::fs::write(&bin, b"").unwrap();
        std::fs::write(&lib, b"").unwrap();
        EmulatorArtifacts::new(bin, lib)
    }

    #[test]
    fn invocation_shape() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifacts(dir.path());
        let r = EmulatorRunner::sanitizer_emulator(art.clone(), Duration::from_secs(5)).unwrap();
        let tc = TestCase::new(
            PathBuf::from("/c/qasan_tests/CWE122_H/bad/CWE122_H__x_01.out"),
            Tool::Qasan,
            GroundTruth::Bad,
            "CWE122_H".into(),
        );
        let inv = r.invocation(&tc);
        assert_eq!(inv.program, art.binary);
        assert_eq!(inv.args, vec![tc.file_path.clone().into_os_string()]);
        assert_eq!(inv.env, vec![("AFL_USE_QASAN".to_string(), "1".to_string())]);
        assert_eq!(r.tool(), Tool::Qasan);
    }

    #[test]
    fn missing_binary_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let art = EmulatorArtifacts::new(dir.path().join("qte-qemu"), dir.path().join("libqte.so"));
        let err = EmulatorRunner::taint_engine(art, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::MissingToolArtifact {
                tool: Tool::Qte,
                kind: ArtifactKind::Binary,
                ..
            }
        ));
    }
}
