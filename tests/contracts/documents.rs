//! Application document contracts
//!
//! Documents are validated before any host is contacted; every problem is
//! reported at once; unknown keys warn instead of failing.

use crate::common::*;

mod init {
    use super::*;

    #[test]
    fn contract_init_writes_loadable_document() {
        let env = TestEnv::new();
        let result = env.init("api", &["--email", "ops@example.com"]);
        assert!(result.success, "init failed: {}", result.stderr);

        let content = env.read(&env.document("api"));
        assert!(content.contains("name: api"));
        assert!(content.contains("domain: api.example.com"));
        assert!(content.contains("email: ops@example.com"));
        assert!(content.contains("port: 3000"));
    }

    #[test]
    fn contract_init_refuses_to_overwrite_without_force() {
        let env = TestEnv::new();
        assert!(env.init("api", &[]).success);
        let before = env.read(&env.document("api"));

        let result = env.init("api", &["--port", "4000"]);
        assert_eq!(result.exit_code, 2);
        assert!(result.stderr.contains("already exists"), "{}", result.stderr);
        assert_eq!(env.read(&env.document("api")), before);
    }

    #[test]
    fn contract_init_rejects_bad_name_before_writing() {
        let env = TestEnv::new();
        let result = env.init("Not_Valid", &[]);
        assert_eq!(result.exit_code, 2);
        assert!(!env.document("Not_Valid").exists());
    }
}

mod validation {
    use super::*;

    #[test]
    fn contract_missing_document_is_a_validation_failure() {
        let env = TestEnv::new();
        let result = env.run(&["status", "--config", "nowhere/docklift.yml"]);
        assert_eq!(result.exit_code, 2);
        assert!(result.stderr.contains("not found"), "{}", result.stderr);
    }

    #[test]
    fn contract_all_problems_reported_together() {
        let env = TestEnv::new();
        let doc = env.document("api");
        env.write(
            &doc,
            "vps:\n  host: 203.0.113.7\n  user: root\n  ssh_key_path: /nonexistent/key\napplication:\n  name: api\n  domain: not a domain\n",
        );

        let result = env.run(&["deploy", "--config", doc.to_str().unwrap()]);
        assert_eq!(result.exit_code, 2);
        assert!(result.stderr.contains("ssh_key_path"), "{}", result.stderr);
        assert!(result.stderr.contains("application.domain"), "{}", result.stderr);
    }

    #[test]
    fn contract_unknown_keys_warn() {
        let env = TestEnv::new();
        let doc = env.document("api");
        env.write(&doc, &document_with_database("api", "/nonexistent/key"));

        let result = env.run(&["status", "--config", doc.to_str().unwrap()]);
        assert_eq!(result.exit_code, 2);
        assert!(result.stderr.contains("colour"), "{}", result.stderr);
    }
}
