//! In-memory host for use case tests
//!
//! Interprets the small shell vocabulary the engine speaks (`mkdir`, `rm`,
//! `mv`, `cat`, `tar`, `printf`, the runtime install pipeline and `docker`)
//! against an in-memory filesystem and container table. Failures can be
//! injected by command substring.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use crate::domain::ports::{CommandOutput, ExecError, ExecResult, RemoteExecutor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Container {
    pub project: String,
    pub config: String,
    pub running: bool,
}

struct Failure {
    pattern: String,
    exit_code: i32,
    stderr: String,
    once: bool,
}

#[derive(Default)]
struct State {
    files: BTreeMap<String, String>,
    /// Raw content of files that are not UTF-8, served as-is by `cat`
    raw_files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    programs: BTreeSet<String>,
    install_works: bool,
    networks: BTreeSet<String>,
    containers: BTreeMap<String, Container>,
    volumes: BTreeSet<String>,
    builds: Vec<String>,
    recreated: usize,
    reloads: usize,
    uploads: usize,
    probe_codes: VecDeque<String>,
    failures: Vec<Failure>,
    unreachable: bool,
    log: Vec<String>,
}

pub(crate) struct FakeHost {
    state: RefCell<State>,
}

impl FakeHost {
    /// Nothing installed; the install script works.
    pub fn fresh() -> Self {
        let host = Self {
            state: RefCell::new(State {
                install_works: true,
                ..State::default()
            }),
        };
        host.put_dir("/tmp");
        host
    }

    /// Runtime installed, nothing else.
    pub fn ready() -> Self {
        let host = Self::fresh();
        host.state.borrow_mut().programs.insert("docker".to_string());
        host
    }

    /// Runtime, shared network and a running proxy.
    pub fn with_proxy() -> Self {
        let host = Self::ready();
        {
            let mut state = host.state.borrow_mut();
            state.networks.insert("docklift".to_string());
            state.containers.insert(
                "docklift-caddy".to_string(),
                Container {
                    project: "docklift-proxy".to_string(),
                    config: String::new(),
                    running: true,
                },
            );
        }
        host.put_dir("/opt/docklift/caddy");
        host
    }

    pub fn install_fails(&self) {
        self.state.borrow_mut().install_works = false;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.borrow_mut().unreachable = unreachable;
    }

    /// Every command containing `pattern` exits with `exit_code`.
    pub fn fail_when(&self, pattern: &str, exit_code: i32, stderr: &str) {
        self.push_failure(pattern, exit_code, stderr, false);
    }

    /// Only the next command containing `pattern` fails.
    pub fn fail_once(&self, pattern: &str, exit_code: i32, stderr: &str) {
        self.push_failure(pattern, exit_code, stderr, true);
    }

    fn push_failure(&self, pattern: &str, exit_code: i32, stderr: &str, once: bool) {
        self.state.borrow_mut().failures.push(Failure {
            pattern: pattern.to_string(),
            exit_code,
            stderr: stderr.to_string(),
            once,
        });
    }

    pub fn add_network(&self, name: &str) {
        self.state.borrow_mut().networks.insert(name.to_string());
    }

    pub fn clear_failures(&self) {
        self.state.borrow_mut().failures.clear();
    }

    /// Status codes the next probes print, in order; `200` once exhausted.
    pub fn probe_codes(&self, codes: &[&str]) {
        self.state
            .borrow_mut()
            .probe_codes
            .extend(codes.iter().map(|c| c.to_string()));
    }

    pub fn put_file(&self, path: &str, content: &str) {
        let mut state = self.state.borrow_mut();
        add_ancestors(&mut state.dirs, path);
        state.raw_files.remove(path);
        state.files.insert(path.to_string(), content.to_string());
    }

    /// A file whose bytes need not be UTF-8.
    pub fn put_bytes(&self, path: &str, content: &[u8]) {
        self.put_file(path, &String::from_utf8_lossy(content));
        self.state
            .borrow_mut()
            .raw_files
            .insert(path.to_string(), content.to_vec());
    }

    pub fn put_dir(&self, path: &str) {
        let mut state = self.state.borrow_mut();
        add_ancestors(&mut state.dirs, path);
        state.dirs.insert(path.to_string());
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.state.borrow().files.get(path).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state.borrow().dirs.contains(path)
    }

    pub fn has_network(&self, name: &str) -> bool {
        self.state.borrow().networks.contains(name)
    }

    pub fn container(&self, name: &str) -> Option<Container> {
        self.state.borrow().containers.get(name).cloned()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state.borrow().containers.keys().cloned().collect()
    }

    pub fn volumes(&self) -> Vec<String> {
        self.state.borrow().volumes.iter().cloned().collect()
    }

    pub fn builds(&self) -> usize {
        self.state.borrow().builds.len()
    }

    pub fn recreated(&self) -> usize {
        self.state.borrow().recreated
    }

    pub fn reloads(&self) -> usize {
        self.state.borrow().reloads
    }

    pub fn uploads(&self) -> usize {
        self.state.borrow().uploads
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    /// Index of the first logged command containing `pattern`.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.state.borrow().log.iter().position(|c| c.contains(pattern))
    }

    fn unreachable_error() -> ExecError {
        ExecError::Unreachable {
            host: "root@fake".to_string(),
            message: "Connection timed out".to_string(),
        }
    }
}

impl RemoteExecutor for FakeHost {
    fn execute(&self, command: &str, _privileged: bool) -> ExecResult<CommandOutput> {
        let mut state = self.state.borrow_mut();
        if state.unreachable {
            return Err(Self::unreachable_error());
        }
        state.log.push(command.to_string());

        if let Some(index) = state.failures.iter().position(|f| command.contains(&f.pattern)) {
            let failure = &state.failures[index];
            let output = CommandOutput::failed(failure.exit_code, failure.stderr.clone());
            if failure.once {
                state.failures.remove(index);
            }
            return Ok(output);
        }

        Ok(state.run_script(command))
    }

    fn upload(&self, local: &Path, remote: &str) -> ExecResult<()> {
        let mut state = self.state.borrow_mut();
        if state.unreachable {
            return Err(Self::unreachable_error());
        }
        let transfer = |message: String| ExecError::Transfer {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            message,
        };
        if !state.dirs.contains(parent(remote)) {
            return Err(transfer(format!("{}: No such file or directory", parent(remote))));
        }
        let bytes = std::fs::read(local).map_err(|e| transfer(e.to_string()))?;
        state.raw_files.remove(remote);
        state
            .files
            .insert(remote.to_string(), String::from_utf8_lossy(&bytes).into_owned());
        state.uploads += 1;
        Ok(())
    }

    fn path_exists(&self, remote: &str) -> ExecResult<bool> {
        let state = self.state.borrow();
        if state.unreachable {
            return Err(Self::unreachable_error());
        }
        Ok(state.files.contains_key(remote) || state.dirs.contains(remote))
    }

    fn program_exists(&self, name: &str) -> ExecResult<bool> {
        let state = self.state.borrow();
        if state.unreachable {
            return Err(Self::unreachable_error());
        }
        Ok(state.programs.contains(name))
    }
}

// === shell interpretation ===

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    And,
    Pipe,
    Redirect,
}

fn tokenize(command: &str) -> Vec<Token> {
    fn flush(tokens: &mut Vec<Token>, word: &mut String, in_word: &mut bool, quoted: &mut bool) {
        if *in_word {
            let token = match (word.as_str(), *quoted) {
                ("&&", false) => Token::And,
                ("|", false) => Token::Pipe,
                (">", false) => Token::Redirect,
                _ => Token::Word(word.clone()),
            };
            tokens.push(token);
        }
        word.clear();
        *in_word = false;
        *quoted = false;
    }

    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                quoted = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    word.push(q);
                }
            }
            '\\' => {
                in_word = true;
                if let Some(next) = chars.next() {
                    word.push(next);
                }
            }
            c if c.is_whitespace() => flush(&mut tokens, &mut word, &mut in_word, &mut quoted),
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    flush(&mut tokens, &mut word, &mut in_word, &mut quoted);
    tokens
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => ".",
    }
}

fn add_ancestors(dirs: &mut BTreeSet<String>, path: &str) {
    let mut current = parent(path);
    while current != "/" && current != "." {
        dirs.insert(current.to_string());
        current = parent(current);
    }
}

fn under(path: &str, root: &str) -> bool {
    path == root || path.starts_with(&format!("{root}/"))
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput::ok(stdout)
}

fn fail(exit_code: i32, stderr: impl Into<String>) -> CommandOutput {
    CommandOutput::failed(exit_code, stderr)
}

impl State {
    fn run_script(&mut self, command: &str) -> CommandOutput {
        let tokens = tokenize(command);
        let mut stdout = String::new();

        for chain in tokens.split(|t| *t == Token::And) {
            let stages: Vec<&[Token]> = chain.split(|t| *t == Token::Pipe).collect();
            let output = if stages.len() > 1 {
                self.run_pipeline(&stages)
            } else {
                self.run_simple(chain)
            };
            stdout.push_str(&output.stdout);
            if !output.success() {
                return CommandOutput::new(output.exit_code, stdout, output.stderr);
            }
        }
        ok(stdout)
    }

    fn run_pipeline(&mut self, stages: &[&[Token]]) -> CommandOutput {
        let words = |tokens: &[Token]| -> Vec<String> {
            tokens
                .iter()
                .filter_map(|t| match t {
                    Token::Word(w) => Some(w.clone()),
                    _ => None,
                })
                .collect()
        };
        let first = words(stages[0]);
        let last = words(stages[stages.len() - 1]);
        match (first.first().map(String::as_str), last.first().map(String::as_str)) {
            (Some("curl"), Some("sh")) if self.install_works => {
                self.programs.insert("docker".to_string());
                ok("Docker installed\n")
            }
            (Some("curl"), Some("sh")) => fail(1, "E: Unable to locate package docker-ce"),
            _ => fail(127, "unsupported pipeline"),
        }
    }

    fn run_simple(&mut self, tokens: &[Token]) -> CommandOutput {
        let mut argv: Vec<String> = Vec::new();
        let mut redirect: Option<String> = None;
        let mut iter = tokens.iter();
        while let Some(token) = iter.next() {
            match token {
                Token::Word(w) => argv.push(w.clone()),
                Token::Redirect => {
                    if let Some(Token::Word(target)) = iter.next() {
                        redirect = Some(target.clone());
                    }
                }
                _ => {}
            }
        }

        let Some(program) = argv.first().cloned() else {
            return ok("");
        };
        let args = &argv[1..];
        let output = match program.as_str() {
            "mkdir" => self.mkdir(args),
            "rm" => self.rm(args),
            "mv" => self.mv(args),
            "cat" => self.cat(args),
            "tar" => self.tar(args),
            "printf" => ok(format!("{}\n", args.iter().skip(1).cloned().collect::<Vec<_>>().join(" "))),
            "docker" if self.programs.contains("docker") => self.docker(args),
            other => fail(127, format!("sh: {other}: command not found")),
        };

        match redirect {
            Some(target) if output.success() => {
                if !self.dirs.contains(parent(&target)) {
                    return fail(1, format!("sh: {target}: No such file or directory"));
                }
                self.files.insert(target, output.stdout);
                ok("")
            }
            _ => output,
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    fn mkdir(&mut self, args: &[String]) -> CommandOutput {
        let parents = args.iter().any(|a| a == "-p");
        for path in args.iter().filter(|a| !a.starts_with('-')) {
            if parents {
                add_ancestors(&mut self.dirs, path);
                self.dirs.insert(path.clone());
                continue;
            }
            if self.exists(path) {
                return fail(1, format!("mkdir: cannot create directory '{path}': File exists"));
            }
            if !self.dirs.contains(parent(path)) && parent(path) != "/" {
                return fail(1, format!("mkdir: cannot create directory '{path}': No such file or directory"));
            }
            self.dirs.insert(path.clone());
        }
        ok("")
    }

    fn rm(&mut self, args: &[String]) -> CommandOutput {
        for path in args.iter().filter(|a| !a.starts_with('-')) {
            self.raw_files.retain(|p, _| !under(p, path));
            self.files.retain(|p, _| !under(p, path));
            self.dirs.retain(|p| !under(p, path));
        }
        ok("")
    }

    fn mv(&mut self, args: &[String]) -> CommandOutput {
        let paths: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
        let [from, to] = paths.as_slice() else {
            return fail(1, "mv: missing operand");
        };
        if !self.exists(from) {
            return fail(1, format!("mv: cannot stat '{from}': No such file or directory"));
        }

        let rename = |p: &str| format!("{}{}", to, &p[from.len()..]);
        let files: Vec<(String, String)> = self
            .files
            .iter()
            .filter(|(p, _)| under(p, from))
            .map(|(p, c)| (rename(p), c.clone()))
            .collect();
        let dirs: Vec<String> = self.dirs.iter().filter(|p| under(p, from)).map(|p| rename(p)).collect();

        self.raw_files.retain(|p, _| !under(p, from) && !under(p, to));
        self.files.retain(|p, _| !under(p, from));
        self.dirs.retain(|p| !under(p, from));
        self.files.extend(files);
        self.dirs.extend(dirs);
        ok("")
    }

    fn cat(&mut self, args: &[String]) -> CommandOutput {
        let Some(path) = args.first() else {
            return fail(1, "cat: missing operand");
        };
        if let Some(bytes) = self.raw_files.get(path) {
            return CommandOutput::from_bytes(0, bytes, b"");
        }
        match self.files.get(path) {
            Some(content) => ok(content.clone()),
            None => fail(1, format!("cat: {path}: No such file or directory")),
        }
    }

    /// `tar -xzf ARCHIVE -C DIR`
    fn tar(&mut self, args: &[String]) -> CommandOutput {
        let archive = args.iter().position(|a| a == "-xzf").and_then(|i| args.get(i + 1));
        let dir = args.iter().position(|a| a == "-C").and_then(|i| args.get(i + 1));
        let (Some(archive), Some(dir)) = (archive, dir) else {
            return fail(2, "tar: usage");
        };
        let Some(content) = self.files.get(archive).cloned() else {
            return fail(2, format!("tar: {archive}: Cannot open: No such file or directory"));
        };
        if !self.dirs.contains(dir) {
            return fail(2, format!("tar: {dir}: Cannot open: No such file or directory"));
        }
        self.files.insert(format!("{dir}/.unpacked"), content);
        ok("")
    }

    fn docker(&mut self, args: &[String]) -> CommandOutput {
        let words: Vec<&str> = args.iter().map(String::as_str).collect();
        match words.as_slice() {
            ["info", ..] => ok("24.0.7\n"),
            ["compose", "version"] => ok("Docker Compose version v2.24.0\n"),
            ["compose", rest @ ..] => self.compose(rest),
            ["network", "inspect", name] => {
                if self.networks.contains(*name) {
                    ok(format!("[{{\"Name\": \"{name}\"}}]\n"))
                } else {
                    fail(1, format!("Error response from daemon: network {name} not found"))
                }
            }
            ["network", "create", name] => {
                if self.networks.insert(name.to_string()) {
                    ok("f00dfeed\n")
                } else {
                    fail(1, format!("Error response from daemon: network with name {name} already exists"))
                }
            }
            ["inspect", "--format", _, name] => match self.containers.get(*name) {
                Some(c) => ok(format!("{}\n", c.running)),
                None => fail(1, format!("Error: No such object: {name}")),
            },
            ["exec", name, "caddy", "reload", ..] => match self.containers.get(*name) {
                Some(c) if c.running => {
                    self.reloads += 1;
                    ok("")
                }
                _ => fail(1, format!("Error response from daemon: container {name} is not running")),
            },
            ["run", "--rm", "--network", network, ..] => {
                if !self.networks.contains(*network) {
                    return fail(125, format!("docker: network {network} not found"));
                }
                let code = self.probe_codes.pop_front().unwrap_or_else(|| "200".to_string());
                if code == "000" {
                    CommandOutput::new(28, code, "")
                } else {
                    ok(code)
                }
            }
            _ => fail(1, format!("unsupported docker invocation: {}", words.join(" "))),
        }
    }

    fn compose(&mut self, args: &[&str]) -> CommandOutput {
        let mut project = None;
        let mut manifest = None;
        let mut rest = args;
        loop {
            match rest {
                ["-p", p, tail @ ..] => {
                    project = Some(p.to_string());
                    rest = tail;
                }
                ["-f", f, tail @ ..] => {
                    manifest = Some(f.to_string());
                    rest = tail;
                }
                _ => break,
            }
        }
        let Some(project) = project else {
            return fail(1, "no project name");
        };

        match rest {
            ["build", ..] => {
                let document = match self.manifest(manifest.as_deref()) {
                    Ok(document) => document,
                    Err(output) => return output,
                };
                let base = parent(manifest.as_deref().unwrap_or_default()).to_string();
                for (_, service) in services(&document) {
                    if let Some(context) = service.get("build").and_then(|b| b.get("context")).and_then(|c| c.as_str()) {
                        let dir = format!("{}/{}", base, context.trim_start_matches("./"));
                        if !self.files.contains_key(&format!("{dir}/.unpacked")) {
                            return fail(1, format!("unable to prepare context: path \"{dir}\" not found"));
                        }
                    }
                }
                self.builds.push(project);
                ok("")
            }
            ["up", flags @ ..] => {
                let document = match self.manifest(manifest.as_deref()) {
                    Ok(document) => document,
                    Err(output) => return output,
                };
                self.up(&project, &document, flags.contains(&"--remove-orphans"))
            }
            ["down", flags @ ..] => {
                self.containers.retain(|_, c| c.project != project);
                if flags.contains(&"-v") {
                    let prefix = format!("{project}_");
                    self.volumes.retain(|v| !v.starts_with(&prefix));
                }
                ok("")
            }
            ["ps", ..] => {
                let lines: String = self
                    .containers
                    .iter()
                    .filter(|(_, c)| c.project == project)
                    .map(|(name, c)| {
                        let state = if c.running { "running" } else { "exited" };
                        format!("{name}\t{state}\tUp 2 minutes\n")
                    })
                    .collect();
                ok(lines)
            }
            _ => fail(1, format!("unsupported compose invocation: {}", rest.join(" "))),
        }
    }

    fn manifest(&self, path: Option<&str>) -> Result<serde_yaml_ng::Value, CommandOutput> {
        let Some(path) = path else {
            return Err(fail(1, "no configuration file provided: not found"));
        };
        let Some(text) = self.files.get(path) else {
            return Err(fail(1, format!("open {path}: no such file or directory")));
        };
        serde_yaml_ng::from_str(text).map_err(|e| fail(15, e.to_string()))
    }

    fn up(&mut self, project: &str, document: &serde_yaml_ng::Value, remove_orphans: bool) -> CommandOutput {
        if let Some(networks) = document.get("networks").and_then(|n| n.as_mapping()) {
            for (name, network) in networks {
                let external = network.get("external").and_then(|e| e.as_bool()).unwrap_or(false);
                let name = name.as_str().unwrap_or_default();
                if external && !self.networks.contains(name) {
                    return fail(1, format!("network {name} declared as external, but could not be found"));
                }
            }
        }

        let mut declared = BTreeSet::new();
        for (service_name, service) in services(document) {
            let name = service
                .get("container_name")
                .and_then(|n| n.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{project}-{service_name}-1"));
            if let Some(existing) = self.containers.get(&name) {
                if existing.project != project {
                    return fail(1, format!("Conflict. The container name \"/{name}\" is already in use"));
                }
            }
            let config = serde_yaml_ng::to_string(service).unwrap_or_default();
            let unchanged = self
                .containers
                .get(&name)
                .is_some_and(|c| c.running && c.config == config);
            if !unchanged {
                if self.containers.contains_key(&name) {
                    self.recreated += 1;
                }
                self.containers.insert(
                    name.clone(),
                    Container {
                        project: project.to_string(),
                        config,
                        running: true,
                    },
                );
            }
            declared.insert(name);
        }

        if remove_orphans {
            self.containers
                .retain(|name, c| c.project != project || declared.contains(name));
        }

        if let Some(volumes) = document.get("volumes").and_then(|v| v.as_mapping()) {
            for name in volumes.keys().filter_map(|k| k.as_str()) {
                self.volumes.insert(format!("{project}_{name}"));
            }
        }
        ok("")
    }
}

fn services(document: &serde_yaml_ng::Value) -> Vec<(String, &serde_yaml_ng::Value)> {
    document
        .get("services")
        .and_then(|s| s.as_mapping())
        .map(|m| {
            m.iter()
                .map(|(k, v)| (k.as_str().unwrap_or_default().to_string(), v))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_respects_quotes() {
        assert_eq!(
            tokenize("printf '%s\\n' 'a && b' > /x && rm -rf '/it'\\''s'"),
            vec![
                Token::Word("printf".into()),
                Token::Word("%s\\n".into()),
                Token::Word("a && b".into()),
                Token::Redirect,
                Token::Word("/x".into()),
                Token::And,
                Token::Word("rm".into()),
                Token::Word("-rf".into()),
                Token::Word("/it's".into()),
            ]
        );
    }

    #[test]
    fn chain_stops_at_first_failure() {
        let host = FakeHost::fresh();
        let out = host.execute("mkdir -p /a && cat /a/missing && mkdir -p /b", true).unwrap();
        assert!(!out.success());
        assert!(host.has_dir("/a"));
        assert!(!host.has_dir("/b"));
    }

    #[test]
    fn plain_mkdir_fails_when_present() {
        let host = FakeHost::fresh();
        assert!(host.execute("mkdir -p /x && mkdir /x/lock", true).unwrap().success());
        assert!(!host.execute("mkdir /x/lock", true).unwrap().success());
    }
}
