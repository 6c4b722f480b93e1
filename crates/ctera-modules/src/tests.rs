//! End-to-end module tests against the in-memory transport

use std::sync::Arc;

use ctera_client::{MemoryTransport, Method};
use ctera_core::{ClientError, ReturnValue, Status};
use serde_json::{json, Map, Value};

use crate::certificate::load_certificate;
use crate::{ModuleRegistry, ModuleRunner, SharedConnector};

fn connection() -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("ctera_host".to_string(), json!("ctera.example.com"));
    args.insert("ctera_user".to_string(), json!("admin"));
    args.insert("ctera_password".to_string(), json!("secret"));
    args
}

async fn run(transport: &Arc<MemoryTransport>, module: &str, args: Value) -> ReturnValue {
    let registry = ModuleRegistry::new();
    let module = registry.get(module).expect("registered module");
    let runner = ModuleRunner::new(Arc::new(SharedConnector::new(transport.clone())));
    let mut raw = connection();
    if let Value::Object(args) = args {
        raw.extend(args);
    }
    runner.run(module.as_ref(), raw).await
}

fn assert_status(rv: &ReturnValue, status: Status, msg: &str) {
    assert_eq!(rv.status(), status, "unexpected outcome: {}", rv.to_json());
    assert_eq!(rv.message(), Some(msg));
}

/// Run the same arguments twice: the first call changes, the second skips.
async fn assert_converges(transport: &Arc<MemoryTransport>, module: &str, args: Value) {
    let first = run(transport, module, args.clone()).await;
    assert_eq!(first.status(), Status::Changed, "{}", first.to_json());
    transport.clear_calls();
    let second = run(transport, module, args).await;
    assert_eq!(second.status(), Status::Skipped, "{}", second.to_json());
    assert!(transport.mutations().is_empty());
}

#[test]
fn test_registry_knows_every_module() {
    let registry = ModuleRegistry::new();
    assert_eq!(registry.names().len(), 21);
    assert!(registry.get("ctera_portal_tenant").is_some());
    assert!(registry.get("ctera_portal_unknown").is_none());
}

#[tokio::test]
async fn test_array_lifecycle() {
    let transport = Arc::new(MemoryTransport::new());
    let args = json!({"array_name": "array", "level": "linear", "members": ["SATA1", "SATA2"]});

    let created = run(&transport, "ctera_filer_array", args.clone()).await;
    assert_status(&created, Status::Changed, "Array created");
    assert_eq!(created.fact("level"), Some(&json!("linear")));
    assert_eq!(
        transport.object("/config/storage/arrays/array"),
        Some(json!({"name": "array", "level": "linear", "members": ["SATA1", "SATA2"]}))
    );

    transport.clear_calls();
    let permuted = json!({"array_name": "array", "level": "linear", "members": ["SATA2", "SATA1"]});
    let again = run(&transport, "ctera_filer_array", permuted).await;
    assert_status(&again, Status::Skipped, "Array already exists");
    assert!(transport.mutations().is_empty());

    let deleted = run(&transport, "ctera_filer_array", json!({"array_name": "array", "state": "absent"})).await;
    assert_status(&deleted, Status::Changed, "Array deleted");
    let gone = run(&transport, "ctera_filer_array", json!({"array_name": "array", "state": "absent"})).await;
    assert_status(&gone, Status::Skipped, "Array already does not exist");
}

#[tokio::test]
async fn test_array_modification_is_skipped() {
    let transport = Arc::new(MemoryTransport::new().with_object(
        "/config/storage/arrays/array",
        json!({"_classname": "Array", "name": "array", "level": "linear", "members": ["SATA1"]}),
    ));

    let rv = run(
        &transport,
        "ctera_filer_array",
        json!({"array_name": "array", "level": "1", "members": ["SATA1", "SATA2"]}),
    )
    .await;
    assert_status(&rv, Status::Skipped, "Array modification is not supported");
    assert!(transport.mutations().is_empty());
}

#[tokio::test]
async fn test_argument_errors_open_no_session() {
    let transport = Arc::new(MemoryTransport::new());

    let rv = run(&transport, "ctera_filer_array", json!({"array_name": "array"})).await;
    assert_eq!(rv.status(), Status::Failed);
    assert!(rv.message().unwrap().contains("level"));
    assert!(transport.calls().is_empty());

    let mut raw = Map::new();
    raw.insert("array_name".to_string(), json!("array"));
    let registry = ModuleRegistry::new();
    let runner = ModuleRunner::new(Arc::new(SharedConnector::new(transport.clone())));
    let module = registry.get("ctera_filer_array").unwrap();
    let rv = runner.run(module.as_ref(), raw).await;
    assert_eq!(rv.status(), Status::Failed);
    assert!(rv.message().unwrap().contains("ctera_host"));
}

#[tokio::test]
async fn test_login_failure_is_reported() {
    let transport = Arc::new(MemoryTransport::new().with_credentials("admin", "other"));

    let rv = run(&transport, "ctera_filer_ntp", json!({"state": "disabled"})).await;
    assert_eq!(rv.status(), Status::Failed);
    assert!(rv.message().unwrap().starts_with("Login failed. Exception: "));
    let methods: Vec<Method> = transport.calls().iter().map(|c| c.method).collect();
    assert_eq!(methods, vec![Method::Login]);
}

#[tokio::test]
async fn test_failures_carry_generic_message_and_still_log_out() {
    let transport =
        Arc::new(MemoryTransport::new().fail(Method::Add, "/config/storage/arrays", 500));

    let rv = run(
        &transport,
        "ctera_filer_array",
        json!({"array_name": "array", "level": "linear"}),
    )
    .await;
    assert_eq!(rv.status(), Status::Failed);
    assert!(rv
        .message()
        .unwrap()
        .starts_with("Array management failed Exception: HTTP 500"));
    assert_eq!(rv.to_json()["failed"], json!(true));
    assert_eq!(transport.calls().last().map(|c| c.method), Some(Method::Logout));
}

#[tokio::test]
async fn test_lookup_errors_other_than_not_found_propagate() {
    let transport = Arc::new(MemoryTransport::new().fail(
        Method::Get,
        "/config/storage/arrays/array",
        500,
    ));

    let rv = run(
        &transport,
        "ctera_filer_array",
        json!({"array_name": "array", "level": "linear"}),
    )
    .await;
    assert_eq!(rv.status(), Status::Failed);
    assert!(!transport.calls().iter().any(|c| c.method == Method::Add));
}

#[tokio::test]
async fn test_runtime_keys_are_ignored() {
    let transport = Arc::new(MemoryTransport::new());
    let rv = run(
        &transport,
        "ctera_filer_array",
        json!({
            "array_name": "array",
            "level": "0",
            "_ansible_check_mode": false,
            "_ansible_debug": false
        }),
    )
    .await;
    assert_eq!(rv.status(), Status::Changed);
}

#[tokio::test]
async fn test_share_requires_directory_on_create() {
    let transport = Arc::new(MemoryTransport::new());
    let rv = run(&transport, "ctera_filer_share", json!({"name": "docs"})).await;
    assert_status(
        &rv,
        Status::Failed,
        "Share management failed Exception: Cannot create new share without a directory",
    );
}

#[tokio::test]
async fn test_share_converges_and_modifies() {
    let transport = Arc::new(MemoryTransport::new());
    let args = json!({
        "name": "docs",
        "directory": "main/docs",
        "acl": [
            {"principal_type": "LocalGroup", "name": "Everyone", "perm": "ReadOnly"},
            {"principal_type": "DomainUser", "name": "bob", "perm": "ReadWrite"}
        ],
        "trusted_nfs_clients": [
            {"address": "192.168.0.0", "netmask": "255.255.255.0", "perm": "ReadWrite"}
        ]
    });
    assert_converges(&transport, "ctera_filer_share", args).await;

    let share = transport.object("/config/fileservices/share/docs").unwrap();
    assert_eq!(share["volume"], json!("main"));
    assert_eq!(share["directory"], json!("/docs"));

    let rv = run(
        &transport,
        "ctera_filer_share",
        json!({"name": "docs", "directory": "/main/docs/", "comment": "team documents"}),
    )
    .await;
    assert_status(&rv, Status::Changed, "Share modified");
    let share = transport.object("/config/fileservices/share/docs").unwrap();
    assert_eq!(share["comment"], json!("team documents"));
    assert_eq!(share["acl"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_ntp_enable_and_disable() {
    let transport = Arc::new(
        MemoryTransport::new().with_object("/config/time", json!({"NTPMode": "disabled"})),
    );

    let enabled = run(
        &transport,
        "ctera_filer_ntp",
        json!({"servers": ["0.pool.ntp.org", "1.pool.ntp.org"]}),
    )
    .await;
    assert_status(&enabled, Status::Changed, "Enabled NTP");

    let permuted = run(
        &transport,
        "ctera_filer_ntp",
        json!({"servers": ["1.pool.ntp.org", "0.pool.ntp.org"]}),
    )
    .await;
    assert_status(&permuted, Status::Skipped, "NTP configuration did not change");

    let updated = run(&transport, "ctera_filer_ntp", json!({"servers": ["time.example.com"]})).await;
    assert_status(&updated, Status::Changed, "Updated NTP configuration");

    let disabled = run(&transport, "ctera_filer_ntp", json!({"state": "disabled"})).await;
    assert_status(&disabled, Status::Changed, "Disabled NTP");
    let again = run(&transport, "ctera_filer_ntp", json!({"state": "disabled"})).await;
    assert_status(&again, Status::Skipped, "NTP is already disabled");

    let missing = run(&transport, "ctera_filer_ntp", json!({"state": "enabled"})).await;
    assert_eq!(missing.status(), Status::Failed);
}

#[tokio::test]
async fn test_snmp_password_only_updated_on_request() {
    let transport = Arc::new(MemoryTransport::new());
    let args = json!({"community_str": "public", "username": "snmp", "password": "first"});
    let enabled = run(&transport, "ctera_filer_snmp", args).await;
    assert_status(&enabled, Status::Changed, "Enabled SNMP");
    assert_eq!(transport.object("/config/snmp").unwrap()["port"], json!(161));

    let other_password = json!({"community_str": "public", "username": "snmp", "password": "second"});
    let rv = run(&transport, "ctera_filer_snmp", other_password.clone()).await;
    assert_status(&rv, Status::Skipped, "No change made to the SNMP configuration");

    let mut forced = other_password;
    forced["update_password"] = json!(true);
    let rv = run(&transport, "ctera_filer_snmp", forced).await;
    assert_status(&rv, Status::Changed, "Modified SNMP configuration");
    assert_eq!(
        transport.object("/config/snmp").unwrap()["snmpV3"]["password"],
        json!("second")
    );

    let rv = run(&transport, "ctera_filer_snmp", json!({"enabled": false})).await;
    assert_status(&rv, Status::Changed, "Disabled SNMP");
    let rv = run(&transport, "ctera_filer_snmp", json!({"enabled": false})).await;
    assert_status(&rv, Status::Skipped, "SNMP is already disabled");
}

#[tokio::test]
async fn test_storage_ca_import() {
    let cert = rcgen::generate_simple_self_signed(vec!["storage.example.com".to_string()]).unwrap();
    let pem = cert.serialize_pem().unwrap();
    let info = load_certificate(&pem).unwrap();
    let transport = Arc::new(MemoryTransport::new());

    let rv = run(&transport, "ctera_filer_storage_ca", json!({"certificate": pem})).await;
    assert_status(&rv, Status::Changed, "Storage CA certificate was updated");

    transport.insert(
        "/status/extStorageTrustedCA",
        json!({"subjectName": info.subject, "issuerName": info.issuer}),
    );
    let rv = run(&transport, "ctera_filer_storage_ca", json!({"certificate": pem})).await;
    assert_status(
        &rv,
        Status::Skipped,
        "No update required. Storage CA certificate did not change",
    );

    let rv = run(
        &transport,
        "ctera_filer_storage_ca",
        json!({"certificate": pem, "force_update": true}),
    )
    .await;
    assert_eq!(rv.status(), Status::Changed);
}

#[tokio::test]
async fn test_domain_controllers() {
    let transport = Arc::new(MemoryTransport::new());
    let args = json!({"domain_controllers": ["dc1.demo.local", "dc2.demo.local"]});
    assert_converges(&transport, "ctera_filer_domain_controllers", args).await;
    assert_eq!(
        transport.object("/config/fileservices/cifs/passwordServer"),
        Some(json!("dc1.demo.local dc2.demo.local"))
    );

    let rv = run(&transport, "ctera_filer_domain_controllers", json!({"state": "absent"})).await;
    assert_status(&rv, Status::Changed, "Static domain controllers removed");
    let rv = run(&transport, "ctera_filer_domain_controllers", json!({"state": "absent"})).await;
    assert_status(&rv, Status::Skipped, "No static domain controllers configuration exists");
}

#[tokio::test]
async fn test_portal_certificate_import_sends_server_certificate_first() {
    let server = rcgen::generate_simple_self_signed(vec!["portal.example.com".to_string()]).unwrap();
    let intermediate = rcgen::generate_simple_self_signed(vec!["ca.example.com".to_string()]).unwrap();
    let server_pem = server.serialize_pem().unwrap();
    let intermediate_pem = intermediate.serialize_pem().unwrap();

    let transport = Arc::new(MemoryTransport::new().on_execute(
        "/settings/ssl",
        "importCertificate",
        |objects, param| {
            let pem = param["certificates"][0].as_str().unwrap_or_default();
            let info =
                load_certificate(pem).map_err(|err| ClientError::Transport(err.to_string()))?;
            objects.insert(
                "/settings/ssl".to_string(),
                json!({"thumbprint": info.thumbprint.to_uppercase()}),
            );
            Ok(Value::Null)
        },
    ));
    let args = json!({
        "private_key": server.serialize_private_key_pem(),
        "server_certificate": server_pem,
        "certificate_chain": [intermediate_pem]
    });

    let rv = run(&transport, "ctera_portal_certificate", args.clone()).await;
    assert_status(&rv, Status::Changed, "SSL certificate was updated");
    let import = transport
        .mutations()
        .into_iter()
        .find(|call| call.name.as_deref() == Some("importCertificate"))
        .unwrap();
    let certificates = import.body.unwrap()["certificates"].clone();
    assert_eq!(certificates[0], json!(server_pem));
    assert_eq!(certificates[1], json!(intermediate_pem));

    let rv = run(&transport, "ctera_portal_certificate", args).await;
    assert_status(&rv, Status::Skipped, "No update required. SSL certificate did not change");
}

#[tokio::test]
async fn test_cloud_folder_lifecycle() {
    let transport = Arc::new(MemoryTransport::new());

    let rv = run(
        &transport,
        "ctera_portal_cloud_folder",
        json!({"name": "docs", "owner": {"name": "alice"}}),
    )
    .await;
    assert_eq!(rv.status(), Status::Failed);
    assert!(transport.calls().is_empty());

    let args = json!({"name": "docs", "group": "engineering", "owner": {"name": "alice"}});
    assert_converges(&transport, "ctera_portal_cloud_folder", args).await;
    assert!(transport.object("/users/alice/cloudDrives/docs").is_some());

    let absent = json!({"name": "docs", "owner": {"name": "alice"}, "state": "absent"});
    let rv = run(&transport, "ctera_portal_cloud_folder", absent.clone()).await;
    assert_status(&rv, Status::Changed, "Cloud Folder deleted");
    let rv = run(&transport, "ctera_portal_cloud_folder", absent).await;
    assert_status(&rv, Status::Skipped, "Cloud Folder already does not exist");
}

#[tokio::test]
async fn test_folder_group_lifecycle() {
    let transport = Arc::new(MemoryTransport::new());
    let args = json!({"name": "engineering", "owner": {"name": "bob", "directory": "demo.local"}});
    assert_converges(&transport, "ctera_portal_folder_group", args).await;
    assert_eq!(
        transport.object("/foldersGroups/engineering").unwrap()["owner"],
        json!("/users/demo.local%5Cbob")
    );

    let absent = json!({"name": "engineering", "state": "absent"});
    let rv = run(&transport, "ctera_portal_folder_group", absent.clone()).await;
    assert_status(&rv, Status::Changed, "Folder Group deleted");
    let rv = run(&transport, "ctera_portal_folder_group", absent).await;
    assert_status(&rv, Status::Skipped, "Folder Group already does not exist");
}

fn directory_transport() -> Arc<MemoryTransport> {
    Arc::new(
        MemoryTransport::new()
            .on_execute("/directoryService", "connect", |objects, param| {
                objects.insert(
                    "/directoryService".to_string(),
                    json!({"domain": param["domain"], "connected": true}),
                );
                Ok(Value::Null)
            })
            .on_execute("/directoryService", "disconnect", |objects, _| {
                objects.insert(
                    "/directoryService".to_string(),
                    json!({"domain": null, "connected": false}),
                );
                Ok(Value::Null)
            }),
    )
}

#[tokio::test]
async fn test_directory_services_connect_and_disconnect() {
    let transport = directory_transport();
    let args = json!({
        "domain": "demo.local",
        "username": "svc",
        "password": "pass",
        "domain_controllers": ["dc1", "dc2"]
    });

    let rv = run(&transport, "ctera_portal_directory_services", args.clone()).await;
    assert_status(&rv, Status::Changed, "Connected to Active Directory");
    assert!(rv.fact("password").is_none());

    let rv = run(&transport, "ctera_portal_directory_services", args.clone()).await;
    assert_status(
        &rv,
        Status::Skipped,
        "The Portal is already connected to Active Directory",
    );

    let mut forced = args;
    forced["force_reconnect"] = json!(true);
    let rv = run(&transport, "ctera_portal_directory_services", forced).await;
    assert_eq!(rv.status(), Status::Changed);

    let rv = run(
        &transport,
        "ctera_portal_directory_services",
        json!({"state": "disconnected"}),
    )
    .await;
    assert_status(
        &rv,
        Status::Changed,
        "Successfully disconnected the Portal from Active Directory",
    );
}

#[tokio::test]
async fn test_directory_services_rejects_three_controllers() {
    let transport = directory_transport();
    let rv = run(
        &transport,
        "ctera_portal_directory_services",
        json!({
            "domain": "demo.local",
            "username": "svc",
            "password": "pass",
            "domain_controllers": ["dc1", "dc2", "dc3"]
        }),
    )
    .await;
    assert_status(
        &rv,
        Status::Failed,
        "Active Directory management failed. Exception: Cannot set more than two static domain controllers",
    );
}

#[tokio::test]
async fn test_access_control_rules() {
    let transport = Arc::new(MemoryTransport::new());
    let admins = json!({"principal_type": "group", "domain": "demo.local", "name": "Domain Admins", "role": "ReadWriteAdmin"});
    let users = json!({"principal_type": "group", "domain": "demo.local", "name": "Domain Users", "role": "EndUser"});
    let module = "ctera_portal_directory_services_access_control";

    let rv = run(&transport, module, json!({"acl": [admins.clone(), users.clone()]})).await;
    assert_status(&rv, Status::Changed, "Configured access control rules");

    let rv = run(&transport, module, json!({"acl": [users.clone(), admins.clone()]})).await;
    assert_status(&rv, Status::Skipped, "Access control details did not change");

    transport.clear_calls();
    let repeated = json!({"acl": [admins.clone(), users.clone(), admins.clone()]});
    let rv = run(&transport, module, repeated).await;
    assert_status(&rv, Status::Skipped, "Access control details did not change");
    assert!(transport.mutations().is_empty());

    let stored = "/directoryService/accessControlRules";
    let mut rules = transport.object(stored).and_then(|v| v.as_array().cloned()).unwrap();
    rules.push(rules[0].clone());
    transport.insert(stored, Value::Array(rules));
    let rv = run(&transport, module, json!({"acl": [users, admins]})).await;
    assert_status(&rv, Status::Skipped, "Access control details did not change");

    let rv = run(&transport, module, json!({"state": "absent"})).await;
    assert_status(&rv, Status::Changed, "Removed access control entries");
    let rv = run(&transport, module, json!({"state": "absent"})).await;
    assert_status(&rv, Status::Skipped, "No access control rules exist");
}

#[tokio::test]
async fn test_init_master_runs_without_login() {
    let transport = Arc::new(MemoryTransport::new().on_execute(
        "/setup",
        "initMaster",
        |objects, _| {
            objects.insert("/setup/status".to_string(), json!({"wizard": "finish"}));
            Ok(Value::Null)
        },
    ));
    let args = json!({
        "email": "admin@example.com",
        "first_name": "Portal",
        "last_name": "Admin",
        "domain": "ctera.example.com"
    });

    let rv = run(&transport, "ctera_portal_init_master", args.clone()).await;
    assert_eq!(rv.status(), Status::Changed);
    let calls = transport.calls();
    assert!(!calls.iter().any(|c| c.method == Method::Login || c.method == Method::Logout));
    let init = calls.iter().find(|c| c.method == Method::Execute).unwrap();
    let body = init.body.clone().unwrap();
    assert_eq!(body["name"], json!("admin"));
    assert_eq!(body["password"], json!("secret"));

    let rv = run(&transport, "ctera_portal_init_master", args).await;
    assert_status(&rv, Status::Skipped, "The Portal Master Server is already configured");
}

#[tokio::test]
async fn test_init_servers_skip_when_finished() {
    let transport = Arc::new(
        MemoryTransport::new().with_object("/setup/status", json!({"wizard": "finish"})),
    );
    let rv = run(
        &transport,
        "ctera_portal_init_application_server",
        json!({"ipaddr": "10.0.0.1", "secret": "s"}),
    )
    .await;
    assert_eq!(rv.status(), Status::Skipped);

    let rv = run(
        &transport,
        "ctera_portal_init_replication_server",
        json!({"ipaddr": "10.0.0.2", "secret": "s", "replicate_from": "db1"}),
    )
    .await;
    assert_eq!(rv.status(), Status::Skipped);
    assert!(transport.mutations().is_empty());
}

#[tokio::test]
async fn test_local_user_requires_password() {
    let transport = Arc::new(MemoryTransport::new());
    let rv = run(&transport, "ctera_portal_local_user", json!({"name": "alice"})).await;
    assert_status(
        &rv,
        Status::Failed,
        "User management failed Exception: Cannot create new user without a password",
    );
    assert_eq!(transport.calls().last().map(|c| c.method), Some(Method::Logout));
}

#[tokio::test]
async fn test_local_user_password_change_out_of_range() {
    let transport = Arc::new(MemoryTransport::new());
    let rv = run(
        &transport,
        "ctera_portal_local_user",
        json!({"name": "alice", "password": "pw", "password_change": 1_000_000_000}),
    )
    .await;
    assert_eq!(rv.status(), Status::Failed, "{}", rv.to_json());
    let msg = rv.message().unwrap_or_default();
    assert!(msg.starts_with("User management failed Exception: Invalid value for password_change"));
    assert!(transport.mutations().is_empty());
    assert_eq!(transport.calls().last().map(|c| c.method), Some(Method::Logout));
}

#[tokio::test]
async fn test_local_user_lifecycle() {
    let transport = Arc::new(MemoryTransport::new());
    let args = json!({
        "name": "alice",
        "email": "alice@example.com",
        "first_name": "Alice",
        "last_name": "Smith",
        "password": "Passw0rd!",
        "role": "EndUser",
        "password_change": "2030-01-01"
    });

    let created = run(&transport, "ctera_portal_local_user", args.clone()).await;
    assert_status(&created, Status::Changed, "User created");
    assert!(created.fact("password").is_none());
    let user = transport.object("/users/alice").unwrap();
    assert_eq!(user["firstName"], json!("Alice"));
    assert_eq!(user["requirePasswordChangeOn"], json!("2030-01-01"));

    let rv = run(&transport, "ctera_portal_local_user", args.clone()).await;
    assert_status(&rv, Status::Skipped, "User details did not change");

    let mut changed = args;
    changed["email"] = json!("alice@corp.example.com");
    let rv = run(&transport, "ctera_portal_local_user", changed).await;
    assert_status(&rv, Status::Changed, "User modified");
    assert_eq!(
        transport.object("/users/alice").unwrap()["email"],
        json!("alice@corp.example.com")
    );

    let absent = json!({"name": "alice", "state": "absent"});
    let rv = run(&transport, "ctera_portal_local_user", absent.clone()).await;
    assert_status(&rv, Status::Changed, "User deleted");
    let rv = run(&transport, "ctera_portal_local_user", absent).await;
    assert_status(&rv, Status::Skipped, "User already does not exist");
}

#[tokio::test]
async fn test_tenant_scope_is_browsed_and_stripped() {
    let transport = Arc::new(MemoryTransport::new());
    let rv = run(
        &transport,
        "ctera_portal_local_user",
        json!({"name": "bob", "password": "pw", "tenant": "acme"}),
    )
    .await;
    assert_eq!(rv.status(), Status::Changed);
    assert!(rv.fact("tenant").is_none());
    assert_eq!(transport.object("/currentPortal"), Some(json!("acme")));

    run(&transport, "ctera_portal_timezone", json!({"timezone": "UTC", "tenant": "$admin"})).await;
    assert_eq!(transport.object("/currentPortal"), Some(json!("")));
}

#[tokio::test]
async fn test_plan_lifecycle() {
    let transport = Arc::new(MemoryTransport::new());
    let args = json!({
        "name": "gold",
        "retention": [{"policy_name": "daily", "duration": 7}, {"policy_name": "weekly", "duration": 4}],
        "quotas": [{"item_name": "EV16", "amount": 2}, {"item_name": "Storage", "amount": 100}]
    });
    assert_converges(&transport, "ctera_portal_plan", args).await;
    let plan = transport.object("/plans/gold").unwrap();
    assert_eq!(plan["retentionPolicy"], json!({"daily": 7, "weekly": 4}));
    assert_eq!(plan["appliances"], json!({"amount": 2}));

    let rv = run(
        &transport,
        "ctera_portal_plan",
        json!({"name": "gold", "quotas": [{"item_name": "Storage", "amount": 200}]}),
    )
    .await;
    assert_status(&rv, Status::Changed, "Plan modified");
    let plan = transport.object("/plans/gold").unwrap();
    assert_eq!(plan["storage"], json!({"amount": 200}));
    assert_eq!(plan["appliances"], json!({"amount": 2}));
}

#[tokio::test]
async fn test_server_is_modify_only() {
    let transport = Arc::new(MemoryTransport::new().with_object(
        "/servers/server1",
        json!({
            "name": "server1",
            "isApplicationServer": true,
            "renderingServer": false,
            "publicIpaddr": null,
            "allowUserLogin": true,
            "replicationSettings": null
        }),
    ));

    let args = json!({"name": "server1", "preview": true, "enable_public_ip": true, "public_ip": "203.0.113.7"});
    assert_converges(&transport, "ctera_portal_server", args).await;
    assert_eq!(
        transport.object("/servers/server1").unwrap()["publicIpaddr"],
        json!("203.0.113.7")
    );

    let rv = run(&transport, "ctera_portal_server", json!({"name": "missing", "app": true})).await;
    assert_eq!(rv.status(), Status::Failed);
    assert!(rv.message().unwrap().starts_with("Server management failed Exception: "));

    let rv = run(&transport, "ctera_portal_server", json!({"name": "server1", "enable_replication": true})).await;
    assert_eq!(rv.status(), Status::Failed);
    assert!(rv.message().unwrap().contains("replica_of"));
}

#[tokio::test]
async fn test_storage_node_bucket_changes_are_not_applied() {
    let transport = Arc::new(MemoryTransport::new());
    let args = json!({
        "name": "main",
        "bucket_info": {
            "bucket_type": "AWS",
            "bucket": "ctera-data",
            "access_key": "AKIA",
            "secret_key": "secret",
            "https": true
        }
    });
    assert_converges(&transport, "ctera_portal_storage_node", args.clone()).await;
    assert_eq!(transport.object("/locations/main").unwrap()["storage"], json!("S3"));

    let mut other_bucket = args.clone();
    other_bucket["bucket_info"]["bucket"] = json!("other");
    let rv = run(&transport, "ctera_portal_storage_node", other_bucket).await;
    assert_status(
        &rv,
        Status::Skipped,
        "Modifying the bucket info is currently not supported Storage Node details did not change",
    );

    let mut read_only = args;
    read_only["read_only"] = json!(true);
    read_only["dedicated_to"] = json!("acme");
    let rv = run(&transport, "ctera_portal_storage_node", read_only).await;
    assert_status(&rv, Status::Changed, "Storage Node was modified");
    let node = transport.object("/locations/main").unwrap();
    assert_eq!(node["readOnly"], json!(true));
    assert_eq!(node["dedicatedPortal"], json!("/portals/acme"));
}

#[tokio::test]
async fn test_syslog() {
    let transport = Arc::new(MemoryTransport::new());
    let rv = run(&transport, "ctera_portal_syslog", json!({"server": "syslog.example.com"})).await;
    assert_status(&rv, Status::Changed, "Syslog server enabled");

    let rv = run(&transport, "ctera_portal_syslog", json!({"server": "syslog.example.com", "port": 514})).await;
    assert_status(&rv, Status::Skipped, "Syslog server config did not change");

    let rv = run(
        &transport,
        "ctera_portal_syslog",
        json!({"server": "syslog.example.com", "min_severity": "error"}),
    )
    .await;
    assert_status(&rv, Status::Changed, "Syslog server configuration was modified");

    let rv = run(&transport, "ctera_portal_syslog", json!({"state": "disabled"})).await;
    assert_status(&rv, Status::Changed, "Syslog server disabled");
    let rv = run(&transport, "ctera_portal_syslog", json!({"state": "disabled"})).await;
    assert_status(&rv, Status::Skipped, "Syslog server is already disabled");
}

fn tenant_transport() -> Arc<MemoryTransport> {
    Arc::new(
        MemoryTransport::new()
            .with_object("/plans/gold", json!({"name": "gold"}))
            .with_object("/plans/silver", json!({"name": "silver"}))
            .on_execute("/portals/acme", "undelete", |objects, _| {
                if let Some(tenant) = objects.get_mut("/portals/acme") {
                    tenant["activationStatus"] = json!("Enabled");
                }
                Ok(Value::Null)
            })
            .on_execute("/portals/acme", "subscribe", |objects, param| {
                if let Some(tenant) = objects.get_mut("/portals/acme") {
                    tenant["plan"] = param["plan"].clone();
                }
                Ok(Value::Null)
            }),
    )
}

#[tokio::test]
async fn test_tenant_create_and_change_plan() {
    let transport = tenant_transport();
    let args = json!({"name": "acme", "display_name": "Acme Corp", "plan": "gold"});
    assert_converges(&transport, "ctera_portal_tenant", args).await;
    assert_eq!(
        transport.object("/portals/acme").unwrap()["plan"],
        json!("/plans/gold")
    );

    let rv = run(
        &transport,
        "ctera_portal_tenant",
        json!({"name": "acme", "plan": "silver", "company": "Acme Inc"}),
    )
    .await;
    assert_status(
        &rv,
        Status::Changed,
        "Plan was changed Modifying tenant details is not supported",
    );
    assert_eq!(rv.fact("plan"), Some(&json!("silver")));
}

#[tokio::test]
async fn test_tenant_undelete() {
    let transport = tenant_transport();
    transport.insert(
        "/portals/acme",
        json!({"name": "acme", "plan": "/plans/gold", "activationStatus": "Disabled"}),
    );

    let rv = run(&transport, "ctera_portal_tenant", json!({"name": "acme", "plan": "gold"})).await;
    assert_status(
        &rv,
        Status::Changed,
        "Tenant was undeleted Tenant details did not change",
    );

    let rv = run(&transport, "ctera_portal_tenant", json!({"name": "acme", "state": "absent"})).await;
    assert_status(&rv, Status::Changed, "Tenant deleted");
}

#[tokio::test]
async fn test_timezone() {
    let transport = Arc::new(MemoryTransport::new().with_object("/settings/timezone", json!("UTC")));
    let rv = run(&transport, "ctera_portal_timezone", json!({"timezone": "(GMT+02:00) Jerusalem"})).await;
    assert_status(&rv, Status::Changed, "Changed timezone");
    assert_eq!(rv.fact("previous_timezone"), Some(&json!("UTC")));

    let rv = run(&transport, "ctera_portal_timezone", json!({"timezone": "(GMT+02:00) Jerusalem"})).await;
    assert_status(&rv, Status::Skipped, "No update required to the current timezone");
}
