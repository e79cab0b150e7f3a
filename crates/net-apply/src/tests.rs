//! Tests for the reconciliation driver

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;

    use crate::ifupdown::{CommandResult, MockInterfaceControl};
    use crate::txn::MockFileInstaller;
    use crate::Reconciler;
    use stornet_config::{AddressResolver, InterfacesParser, Merger, ServiceConf};
    use stornet_core::error::SystemError;
    use stornet_core::NetError;

    fn conf() -> ServiceConf {
        ServiceConf::new("eth0=10.1.1.,eth0.100=10.1.100.", "5", "eth0,eth0.100")
    }

    fn ok_result() -> CommandResult {
        CommandResult {
            success: true,
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    fn failed_result(stderr: &str) -> CommandResult {
        CommandResult {
            success: false,
            exit_code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    /// Fully merged file content for the given interfaces, as one run
    /// of the merge engine would write it.
    fn merged_content(conf: &ServiceConf, names: &[&str]) -> String {
        let resolver = AddressResolver::from_table(&conf.iface_networks, conf.node_id.clone());
        let merger = Merger::new(&resolver);
        let parser = InterfacesParser::new();
        let mut file = parser.parse("").unwrap();
        for name in names {
            merger.ensure(&mut file, name).unwrap();
        }
        parser.render(&file)
    }

    fn recording_control(calls: &Arc<Mutex<Vec<String>>>) -> MockInterfaceControl {
        let mut control = MockInterfaceControl::new();
        {
            let calls = calls.clone();
            control.expect_bring_down().returning(move |name| {
                calls.lock().unwrap().push(format!("down {}", name));
                Ok(ok_result())
            });
        }
        {
            let calls = calls.clone();
            control.expect_bring_up().returning(move |name| {
                calls.lock().unwrap().push(format!("up {}", name));
                Ok(ok_result())
            });
        }
        control
    }

    fn installing_installer(calls: &Arc<Mutex<Vec<String>>>) -> MockFileInstaller {
        let mut installer = MockFileInstaller::new();
        let calls = calls.clone();
        installer
            .expect_install()
            .times(1)
            .returning(move |_, _, _, source, dest| {
                calls.lock().unwrap().push("install".to_string());
                std::fs::copy(source, dest).unwrap();
                Ok(())
            });
        installer
    }

    #[tokio::test]
    async fn fresh_file_cycles_changed_interfaces_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("interfaces");
        std::fs::write(&path, "").unwrap();

        let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let control = recording_control(&calls);
        let installer = installing_installer(&calls);

        let reconciler = Reconciler::new(&conf(), Arc::new(control), Arc::new(installer))
            .with_interfaces_path(&path);
        let report = reconciler.run("eth0.100,eth0").await.unwrap();

        assert!(report.changed);
        assert_eq!(report.changed_interfaces, vec!["eth0", "eth0.100"]);
        assert_eq!(report.requested, vec!["eth0.100", "eth0"]);

        // Changed set goes down reverse-sorted (children first), comes
        // up sorted (parents first); the final pass follows caller
        // order.
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "down eth0.100",
                "down eth0",
                "install",
                "up eth0",
                "up eth0.100",
                "up eth0.100",
                "up eth0",
            ]
        );

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("auto eth0\n"));
        assert!(written.contains("iface eth0.100 inet static\n"));
        assert!(written.contains("  vlan-raw-device eth0\n"));
    }

    #[tokio::test]
    async fn satisfied_file_skips_install_and_cycling() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("interfaces");
        let content = merged_content(&conf(), &["eth0", "eth0.100"]);
        std::fs::write(&path, &content).unwrap();

        let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let mut control = MockInterfaceControl::new();
        control.expect_bring_down().times(0);
        {
            let calls = calls.clone();
            control.expect_bring_up().returning(move |name| {
                calls.lock().unwrap().push(format!("up {}", name));
                Ok(ok_result())
            });
        }
        let mut installer = MockFileInstaller::new();
        installer.expect_install().times(0);

        let reconciler = Reconciler::new(&conf(), Arc::new(control), Arc::new(installer))
            .with_interfaces_path(&path);
        let report = reconciler.run("eth0,eth0.100").await.unwrap();

        assert!(!report.changed);
        assert!(report.changed_interfaces.is_empty());
        assert_eq!(*calls.lock().unwrap(), vec!["up eth0", "up eth0.100"]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn final_bring_up_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("interfaces");
        std::fs::write(&path, merged_content(&conf(), &["eth0", "eth0.100"])).unwrap();

        let mut control = MockInterfaceControl::new();
        control
            .expect_bring_up()
            .returning(|_| Ok(failed_result("no such interface")));
        let mut installer = MockFileInstaller::new();
        installer.expect_install().times(0);

        let reconciler = Reconciler::new(&conf(), Arc::new(control), Arc::new(installer))
            .with_interfaces_path(&path);
        match reconciler.run("eth0").await {
            Err(NetError::System(SystemError::InterfaceOperation { interface })) => {
                assert_eq!(interface, "eth0")
            }
            other => panic!("expected a fatal bring-up error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bring_down_failures_are_swallowed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("interfaces");
        std::fs::write(&path, "").unwrap();

        let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let mut control = MockInterfaceControl::new();
        control
            .expect_bring_down()
            .returning(|_| Ok(failed_result("interface not configured")));
        {
            let calls = calls.clone();
            control.expect_bring_up().returning(move |name| {
                calls.lock().unwrap().push(format!("up {}", name));
                Ok(ok_result())
            });
        }
        let installer = installing_installer(&calls);

        let reconciler = Reconciler::new(&conf(), Arc::new(control), Arc::new(installer))
            .with_interfaces_path(&path);
        let report = reconciler.run("eth0").await.unwrap();
        assert!(report.changed);
    }

    #[tokio::test]
    async fn dry_run_reports_without_touching_anything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("interfaces");
        std::fs::write(&path, "").unwrap();

        let mut control = MockInterfaceControl::new();
        control.expect_bring_up().times(0);
        control.expect_bring_down().times(0);
        let mut installer = MockFileInstaller::new();
        installer.expect_install().times(0);

        let reconciler = Reconciler::new(&conf(), Arc::new(control), Arc::new(installer))
            .with_interfaces_path(&path);
        let report = reconciler.dry_run("eth0,eth0.100").await.unwrap();

        assert!(report.changed);
        assert_eq!(report.changed_interfaces, vec!["eth0", "eth0.100"]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn missing_interfaces_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist");

        let mut control = MockInterfaceControl::new();
        control.expect_bring_up().times(0);
        control.expect_bring_down().times(0);
        let mut installer = MockFileInstaller::new();
        installer.expect_install().times(0);

        let reconciler = Reconciler::new(&conf(), Arc::new(control), Arc::new(installer))
            .with_interfaces_path(&path);
        assert!(matches!(
            reconciler.run("eth0").await,
            Err(NetError::Io(_))
        ));
    }
}
