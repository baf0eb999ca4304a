use std::path::PathBuf;

use crate::error::Result;
use crate::host::Host;
use crate::runner::{RunOptions, Target};

pub async fn execute(host: &Host, config: &str, artifact: PathBuf, args: Vec<String>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    run_from(host, config, artifact, args, cwd).await
}

/// Runs `artifact` as typed in `cwd`, which may be below the project root.
/// Relative paths in the artifact and in `args` keep their shell meaning.
async fn run_from(
    host: &Host,
    config: &str,
    artifact: PathBuf,
    args: Vec<String>,
    cwd: PathBuf,
) -> Result<()> {
    let target = Target::executable(cwd.join(artifact));
    let options = RunOptions {
        args,
        cwd: Some(cwd),
        ..Default::default()
    };

    host.run(config, &target, &options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::platform::{HostArch, HostOs, HostPlatform};
    use crate::project_config::{Project, PROJECT_FILE};
    use crate::services::testing::FakeServices;

    fn host_in(dir: &std::path::Path, sdks: &std::path::Path, fakes: &FakeServices) -> Host {
        let app = AppConfig {
            sdk_root: sdks.display().to_string(),
            ..Default::default()
        };
        Host::new(
            app,
            Project::discover(dir).unwrap(),
            fakes.services(),
            HostPlatform::new(HostOs::Linux, HostArch::X86_64),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_relative_artifact_resolves_from_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        let sdks = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join(PROJECT_FILE), "build_dir: build\n").unwrap();
        let sub = root.path().join("sub");
        std::fs::create_dir_all(&sub).unwrap();

        let fakes = FakeServices::new("unused");
        let host = host_in(&sub, sdks.path(), &fakes);
        assert_eq!(host.project().root, root.path());

        run_from(
            &host,
            "native-make-debug",
            PathBuf::from("out/app"),
            vec!["data.txt".to_string()],
            sub.clone(),
        )
        .await
        .unwrap();

        let calls = fakes.process.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, sub.join("out/app").display().to_string());
        assert_eq!(calls[0].cwd.as_deref(), Some(sub.as_path()));
        assert_eq!(calls[0].args, vec!["data.txt"]);
    }

    #[tokio::test]
    async fn test_absolute_artifact_is_kept() {
        let root = tempfile::tempdir().unwrap();
        let sdks = tempfile::tempdir().unwrap();
        let fakes = FakeServices::new("unused");
        let host = host_in(root.path(), sdks.path(), &fakes);
        let artifact = root.path().join("build/app");

        run_from(
            &host,
            "native-make-debug",
            artifact.clone(),
            Vec::new(),
            root.path().join("elsewhere"),
        )
        .await
        .unwrap();

        assert_eq!(fakes.process.calls()[0].program, artifact.display().to_string());
    }
}
