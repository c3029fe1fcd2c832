//! Scripted collaborators for driving the installer without a Termux host
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;
use tokio::sync::Notify;

use mc_server_installer::config::InstallerConfig;
use mc_server_installer::install::core::{
    AsyncTask, CommandRunner, CommandSpec, CommandStatus, InstallContext,
};
use mc_server_installer::install::download::Downloader;
use mc_server_installer::install::environment::HostProbe;
use mc_server_installer::install::error::InstallError;
use mc_server_installer::install::space::SpaceReading;
use mc_server_installer::install::wizard::Prompter;
use mc_server_installer::install::{
    InstallReport, Orchestrator, RunOptions, run_with_interrupt,
};

pub const TEMPLATE: &str = "SERVER_PORT=25565\nRAM=1G\n";
pub const PLAYIT_BYTES: &[u8] = b"\x7fELF playit-agent";
pub const FILEBROWSER_BYTES: &[u8] = b"\x7fELF filebrowser";

/// Files a fake `git clone` produces
#[derive(Debug, Clone, Copy)]
pub struct ProjectFixture {
    pub marker: bool,
    pub manifest: bool,
    pub template: bool,
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self {
            marker: true,
            manifest: true,
            template: true,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RunnerFlags {
    pub refresh_fails: bool,
    pub pull_fails: bool,
    pub pip_fails: bool,
    /// `termux-setup-storage` creates `~/storage`
    pub grants_storage: bool,
}

/// Records every command and simulates pkg, dpkg, git and pip
pub struct FakeRunner {
    home: PathBuf,
    calls: Mutex<Vec<CommandSpec>>,
    installed: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    fixture: Mutex<ProjectFixture>,
    flags: Mutex<RunnerFlags>,
}

impl FakeRunner {
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            calls: Mutex::new(Vec::new()),
            installed: Mutex::new(HashSet::new()),
            failing: Mutex::new(HashSet::new()),
            fixture: Mutex::new(ProjectFixture::default()),
            flags: Mutex::new(RunnerFlags::default()),
        }
    }

    pub fn fail_package(&self, package: &str) {
        self.failing.lock().unwrap().insert(package.to_string());
    }

    pub fn preinstall(&self, package: &str) {
        self.installed.lock().unwrap().insert(package.to_string());
    }

    pub fn set_fixture(&self, f: impl FnOnce(&mut ProjectFixture)) {
        f(&mut self.fixture.lock().unwrap());
    }

    pub fn set_flags(&self, f: impl FnOnce(&mut RunnerFlags)) {
        f(&mut self.flags.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered command lines, in order
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    /// Number of calls of `program` whose first argument is `subcommand`
    pub fn count(&self, program: &str, subcommand: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| {
                c.program == program && c.args.first().map(String::as_str) == Some(subcommand)
            })
            .count()
    }

    pub fn ran(&self, program: &str) -> bool {
        self.calls().iter().any(|c| c.program == program)
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn execute(&self, spec: &CommandSpec) -> CommandStatus {
        let flags = *self.flags.lock().unwrap();
        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
        let ok = |success: bool| {
            if success {
                CommandStatus::SUCCESS
            } else {
                CommandStatus::FAILURE
            }
        };

        match (spec.program.as_str(), args.as_slice()) {
            ("dpkg", ["-s", package]) => ok(self.installed.lock().unwrap().contains(*package)),
            ("pkg", ["update", ..]) => ok(!flags.refresh_fails),
            ("pkg", ["install", "-y", package]) => {
                if self.failing.lock().unwrap().contains(*package) {
                    return CommandStatus::FAILURE;
                }
                self.installed.lock().unwrap().insert(package.to_string());
                CommandStatus::SUCCESS
            }
            ("git", ["clone", .., dest]) => {
                self.write_checkout(Path::new(dest));
                CommandStatus::SUCCESS
            }
            ("git", ["pull", ..]) => {
                if flags.pull_fails {
                    return CommandStatus::FAILURE;
                }
                if let Some(root) = &spec.cwd {
                    fs::write(root.join("main.py"), "print('updated')\n").unwrap();
                }
                CommandStatus::SUCCESS
            }
            (_, ["-m", "pip", ..]) => ok(!flags.pip_fails),
            ("termux-setup-storage", _) => {
                if flags.grants_storage {
                    fs::create_dir_all(self.home.join("storage")).unwrap();
                }
                CommandStatus::SUCCESS
            }
            _ => CommandStatus::SUCCESS,
        }
    }

    fn write_checkout(&self, dest: &Path) {
        let fixture = *self.fixture.lock().unwrap();
        fs::create_dir_all(dest.join(".git")).unwrap();
        if fixture.marker {
            fs::write(dest.join("main.py"), "print('mc-server-termux')\n").unwrap();
        }
        if fixture.manifest {
            fs::write(dest.join("requirements.txt"), "rich\npython-dotenv\n").unwrap();
        }
        if fixture.template {
            fs::write(dest.join(".env.example"), TEMPLATE).unwrap();
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: CommandSpec) -> AsyncTask<std::io::Result<CommandStatus>> {
        if let Some(log) = &spec.log {
            fs::create_dir_all(log.parent().unwrap()).unwrap();
            fs::write(log, format!("# $ {spec}\n")).unwrap();
        }
        let status = self.execute(&spec);
        self.calls.lock().unwrap().push(spec);
        AsyncTask::ready(Ok(status))
    }
}

#[derive(Debug, Clone)]
pub struct HostState {
    pub sandbox: bool,
    pub storage: bool,
    pub online: bool,
    pub free_space: Option<SpaceReading>,
    pub arch: String,
}

pub struct FakeHost {
    home: PathBuf,
    state: Mutex<HostState>,
    probes: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            state: Mutex::new(HostState {
                sandbox: true,
                storage: true,
                online: true,
                free_space: Some(SpaceReading::human("1.2G")),
                arch: "aarch64".to_string(),
            }),
            probes: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, f: impl FnOnce(&mut HostState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }
}

impl HostProbe for FakeHost {
    fn is_sandbox(&self) -> bool {
        self.state.lock().unwrap().sandbox
    }

    fn storage_granted(&self) -> bool {
        self.state.lock().unwrap().storage || self.home.join("storage").is_dir()
    }

    fn architecture(&self) -> AsyncTask<String> {
        AsyncTask::ready(self.state.lock().unwrap().arch.clone())
    }

    fn free_space(&self) -> AsyncTask<Option<SpaceReading>> {
        AsyncTask::ready(self.state.lock().unwrap().free_space.clone())
    }

    fn reachable(&self, target: &str, _timeout: std::time::Duration) -> AsyncTask<bool> {
        self.probes.lock().unwrap().push(target.to_string());
        AsyncTask::ready(self.state.lock().unwrap().online)
    }
}

/// Serves helper payloads from memory
#[derive(Default)]
pub struct FakeDownloader {
    urls: Mutex<Vec<String>>,
    failing: Mutex<Vec<String>>,
}

impl FakeDownloader {
    /// Fail every URL containing `fragment`
    pub fn fail_matching(&self, fragment: &str) {
        self.failing.lock().unwrap().push(fragment.to_string());
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl Downloader for FakeDownloader {
    fn fetch(&self, url: &str, dest: &Path) -> AsyncTask<anyhow::Result<u64>> {
        self.urls.lock().unwrap().push(url.to_string());
        if self.failing.lock().unwrap().iter().any(|f| url.contains(f.as_str())) {
            return AsyncTask::ready(Err(anyhow::anyhow!("connection reset by peer")));
        }

        let payload = if url.ends_with(".tar.gz") {
            filebrowser_archive()
        } else {
            PLAYIT_BYTES.to_vec()
        };
        fs::write(dest, &payload).unwrap();
        AsyncTask::ready(Ok(payload.len() as u64))
    }
}

fn filebrowser_archive() -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let members = [("LICENSE", b"Apache-2.0".as_slice()), ("filebrowser", FILEBROWSER_BYTES)];
    for (name, data) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Answers prompts from queues; an empty queue answers with the default
#[derive(Default)]
pub struct ScriptedPrompter {
    confirms: Mutex<VecDeque<bool>>,
    inputs: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn answer_confirm(&self, answer: bool) {
        self.confirms.lock().unwrap().push_back(answer);
    }

    pub fn answer_input(&self, answer: &str) {
        self.inputs.lock().unwrap().push_back(answer.to_string());
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, InstallError> {
        self.asked.lock().unwrap().push(message.to_string());
        Ok(self.confirms.lock().unwrap().pop_front().unwrap_or(default))
    }

    fn input(&self, message: &str, default: &str) -> Result<String, InstallError> {
        self.asked.lock().unwrap().push(message.to_string());
        Ok(self
            .inputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| default.to_string()))
    }
}

/// Holds the user's answer until the test lets go. Signals `waiting` as soon
/// as a question is open.
pub struct BlockingPrompter {
    pub waiting: Arc<Notify>,
    release: Mutex<Receiver<()>>,
}

impl BlockingPrompter {
    /// The prompter plus the handle that unblocks it; dropping the handle
    /// answers every open question with "no"
    pub fn new() -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let prompter = Arc::new(Self {
            waiting: Arc::new(Notify::new()),
            release: Mutex::new(rx),
        });
        (prompter, tx)
    }

    fn block(&self) {
        self.waiting.notify_one();
        let _ = self.release.lock().unwrap().recv();
    }
}

impl Prompter for BlockingPrompter {
    fn confirm(&self, _message: &str, _default: bool) -> Result<bool, InstallError> {
        self.block();
        Ok(false)
    }

    fn input(&self, _message: &str, _default: &str) -> Result<String, InstallError> {
        self.block();
        Ok("3".to_string())
    }
}

/// A sandboxed home directory plus one of each fake
pub struct Harness {
    _dir: TempDir,
    pub config: InstallerConfig,
    /// Stand-in for the installer executable, outside the home directory
    pub installer: PathBuf,
    pub runner: Arc<FakeRunner>,
    pub host: Arc<FakeHost>,
    pub downloader: Arc<FakeDownloader>,
    pub prompter: Arc<ScriptedPrompter>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        let scratch = dir.path().join("tmp");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&scratch).unwrap();
        let installer = dir.path().join("dist").join("mcst-install");
        fs::create_dir_all(installer.parent().unwrap()).unwrap();
        fs::write(&installer, b"\x7fELF installer").unwrap();

        let mut config = InstallerConfig::for_home(&home, &scratch);
        config.storage_grant_wait_secs = 0;
        config.poll_interval_ms = 1;

        Self {
            runner: Arc::new(FakeRunner::new(&home)),
            host: Arc::new(FakeHost::new(&home)),
            downloader: Arc::new(FakeDownloader::default()),
            prompter: Arc::new(ScriptedPrompter::default()),
            config,
            installer,
            _dir: dir,
        }
    }

    pub fn context(&self) -> InstallContext {
        self.context_with(self.prompter.clone())
    }

    /// Same fakes, different prompter
    pub fn context_with(&self, prompter: Arc<dyn Prompter>) -> InstallContext {
        InstallContext::new(
            self.config.clone(),
            self.runner.clone(),
            self.host.clone(),
            self.downloader.clone(),
            prompter,
        )
    }

    pub async fn run(&self) -> Result<InstallReport, InstallError> {
        Orchestrator::new(self.context()).run().await
    }

    /// Full run as the binary performs it, without the launch prompt
    pub async fn exit_code(&self) -> i32 {
        self.exit_code_with(RunOptions::default(), std::future::pending::<()>()).await
    }

    /// Full run that also removes [`Self::installer`] once it completes
    pub async fn exit_code_removing_installer(&self) -> i32 {
        self.exit_code_with(self.removal(), std::future::pending::<()>()).await
    }

    pub async fn exit_code_with(
        &self,
        options: RunOptions,
        interrupt: impl Future<Output = ()>,
    ) -> i32 {
        run_with_interrupt(self.context(), options, interrupt).await
    }

    pub fn removal(&self) -> RunOptions {
        RunOptions {
            launch: false,
            remove_installer: Some(self.installer.clone()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.config.install_root
    }

    pub fn home(&self) -> &Path {
        &self.config.home_dir
    }

    pub fn profile(&self) -> String {
        fs::read_to_string(&self.config.shell_profile).unwrap_or_default()
    }

    /// Every file and directory under the home directory, relative to it
    pub fn home_entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(self.home())
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap().path().strip_prefix(self.home()).unwrap().to_path_buf())
            .collect();
        entries.sort();
        entries
    }
}
