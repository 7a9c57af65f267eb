//! Port assignment contracts
//!
//! The workspace is the parent of every application root; ports recorded
//! by sibling documents are taken, the lowest free port from 3000 is used.

use crate::common::*;

use docklift::application::InitUseCase;
use docklift::infrastructure::YamlSpecRepository;

fn recorded_port(env: &TestEnv, name: &str) -> Option<u16> {
    let content = env.read(&env.document(name));
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("port: "))
        .and_then(|p| p.trim().parse().ok())
}

mod allocation {
    use super::*;

    #[test]
    fn contract_first_app_gets_base_port_second_gets_next() {
        let env = TestEnv::new();

        let api = env.init("api", &[]);
        assert!(api.success, "init api failed: {}", api.stderr);
        let web = env.init("web", &[]);
        assert!(web.success, "init web failed: {}", web.stderr);

        assert_eq!(recorded_port(&env, "api"), Some(3000));
        assert_eq!(recorded_port(&env, "web"), Some(3001));
    }

    #[test]
    fn contract_next_free_after_contiguous_run() {
        let env = TestEnv::new();
        let key = env.ssh_key();
        for (name, port) in [("one", 3000), ("two", 3001), ("three", 3002)] {
            env.write(
                &env.document(name),
                &document(name, key.to_str().unwrap(), Some(port)),
            );
        }

        let result = env.init("four", &[]);
        assert!(result.success, "init failed: {}", result.stderr);
        assert_eq!(recorded_port(&env, "four"), Some(3003));
    }

    #[test]
    fn contract_explicit_port_is_taken_verbatim() {
        let env = TestEnv::new();
        assert!(env.init("api", &[]).success);

        let result = env.init("web", &["--port", "3000"]);
        assert!(result.success, "init failed: {}", result.stderr);
        assert_eq!(recorded_port(&env, "web"), Some(3000));
    }

    #[test]
    fn contract_reinit_keeps_existing_port() {
        let env = TestEnv::new();
        assert!(env.init("api", &[]).success);
        assert!(env.init("web", &[]).success);

        let again = env.init("web", &["--force"]);
        assert!(again.success, "re-init failed: {}", again.stderr);
        assert_eq!(recorded_port(&env, "web"), Some(3001));
    }
}

mod deploy_time {
    use super::*;

    #[test]
    fn contract_portless_document_is_assigned_and_persisted() {
        let env = TestEnv::new();
        let key = env.ssh_key();
        env.write(
            &env.document("api"),
            &document("api", key.to_str().unwrap(), Some(3000)),
        );
        let web = env.document("web");
        env.write(&web, &document("web", key.to_str().unwrap(), None));
        env.write(&env.app_root("web").join("Dockerfile"), "FROM scratch\n");

        let init = InitUseCase::new(YamlSpecRepository::new());
        let (settings, assignment) = init.ensure_port(&web).unwrap();
        assert_eq!(assignment.port, 3001);
        assert!(assignment.allocated);
        assert_eq!(settings.application.port, Some(3001));
        assert_eq!(recorded_port(&env, "web"), Some(3001));

        // A second call sees the persisted port.
        let (_, again) = init.ensure_port(&web).unwrap();
        assert_eq!(again.port, 3001);
        assert!(!again.allocated);
    }

    #[test]
    fn contract_invalid_document_gets_no_port() {
        let env = TestEnv::new();
        let web = env.document("web");
        env.write(&web, &document("web", "/nonexistent/key", None));

        let init = InitUseCase::new(YamlSpecRepository::new());
        assert!(init.ensure_port(&web).is_err());
        assert_eq!(recorded_port(&env, "web"), None);
    }
}
