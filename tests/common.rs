use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Releases URL that refuses connections, so offline tests fail fast if
/// they ever reach for the network.
pub const OFFLINE_RELEASES_URL: &str = "http://127.0.0.1:9/updates";

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub config_path: PathBuf,
    pub install_dir: PathBuf,
    pub desktop_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config").join("config.json");
        let install_dir = temp_dir.path().join("vscvm");
        let desktop_dir = temp_dir.path().join("applications");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_vscvm"));

        Self {
            _temp_dir: temp_dir,
            config_path,
            install_dir,
            desktop_dir,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("VSCVM_CONFIG_PATH", &self.config_path);
        cmd.env("VSCVM_DIR", &self.install_dir);
        cmd.env("VSCVM_DESKTOP_DIR", &self.desktop_dir);
        cmd.env("VSCVM_RELEASES_URL", OFFLINE_RELEASES_URL);
        cmd.env_remove("RUST_LOG");
        // Isolate anything resolved through the home directory
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_DATA_HOME", self._temp_dir.path().join("data"));
        cmd.env("XDG_CONFIG_HOME", self._temp_dir.path().join("xdg-config"));
        cmd
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .args(args)
            .output()
            .expect("Failed to run vscvm")
            .into()
    }

    pub fn launcher_path(&self) -> PathBuf {
        self.install_dir.join("code")
    }

    pub fn desktop_file(&self) -> PathBuf {
        self.desktop_dir.join("vscvm-code.desktop")
    }

    /// Lays out an extracted VSCode tree for `version` and returns its
    /// launcher binary.
    pub fn fake_install(&self, version: &str) -> PathBuf {
        let exec = self
            .install_dir
            .join(version)
            .join("VSCode-linux-x64")
            .join("bin")
            .join("code");
        fs::create_dir_all(exec.parent().unwrap()).unwrap();
        fs::write(&exec, "#!/bin/sh\necho fake code\n").unwrap();
        exec
    }

    /// Points the launcher and desktop entry at `version`, as an install would.
    pub fn activate(&self, version: &str) {
        let exec = self.fake_install(version);
        fs::write(
            self.launcher_path(),
            format!("#!/bin/sh\nexec '{}' \"$@\"\n", exec.display()),
        )
        .unwrap();
        fs::create_dir_all(&self.desktop_dir).unwrap();
        fs::write(
            self.desktop_file(),
            format!("[Desktop Entry]\nExec={} %F\n", self.launcher_path().display()),
        )
        .unwrap();
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert_eq!(
            self.status.code(),
            Some(1),
            "Expected exit code 1\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    /// Log lines may land on either stream.
    pub fn assert_output_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text) || self.stderr.contains(text),
            "Output did not contain '{}'\nstdout: {}\nstderr: {}",
            text,
            self.stdout,
            self.stderr
        );
        self
    }
}
