#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use futures::stream::{self, BoxStream, StreamExt};
    use ring::rand::SystemRandom;
    use rocket::figment::Figment;
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;
    use poll_shared::models::*;
    use poll_shared::error::{ErrorCode, ErrorResponse};
    use poll_shared::tally::tags_of;
    use crate::admin::{basic_password, AdminGate};
    use crate::catalog::Catalog;
    use crate::config::AppConfig;
    use crate::connection::*;
    use crate::error::ApiError;
    use crate::generator::{GenerationError, PoemGenerator};
    use crate::processor::{SaveOutcome, VoteProcessor};
    use crate::prompt::{compose, sample_notes, PromptInput, RHYME_DIRECTIVE, POET_PERSONA};
    use crate::routes::AppState;
    use crate::store::{EphemeralRepository, StoreError, VoteRepository};

    const SHORT: Duration = Duration::from_millis(200);

    struct CountingConnector {
        calls: Arc<AtomicUsize>,
        repository: Option<Arc<dyn VoteRepository>>,
    }

    #[rocket::async_trait]
    impl Connector for CountingConnector {
        async fn connect(&self, _credentials: StoreCredentials) -> Result<ConnectionHandle, ConnectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.repository {
                Some(repository) => Ok(ConnectionHandle::new(repository.clone())),
                None => Err(ConnectionError::Connect("connection refused".into())),
            }
        }
    }

    struct HangingConnector;

    #[rocket::async_trait]
    impl Connector for HangingConnector {
        async fn connect(&self, _credentials: StoreCredentials) -> Result<ConnectionHandle, ConnectionError> {
            std::future::pending().await
        }
    }

    /// Serves `fail_after` records, then breaks; appends always fail.
    struct FlakyRepository {
        records: Vec<VoteRecord>,
        fail_after: usize,
    }

    #[rocket::async_trait]
    impl VoteRepository for FlakyRepository {
        async fn append(&self, _record: &VoteRecord) -> Result<(), StoreError> {
            Err(StoreError::Backend("write rejected".into()))
        }

        fn stream(&self) -> BoxStream<'_, Result<VoteRecord, StoreError>> {
            let head = self.records.iter().take(self.fail_after).cloned().map(Ok);
            let broken = std::iter::once(Err(StoreError::Backend("connection reset".into())));
            stream::iter(head.chain(broken)).boxed()
        }

        fn kind(&self) -> &'static str {
            "flaky"
        }
    }

    struct HangingRepository;

    #[rocket::async_trait]
    impl VoteRepository for HangingRepository {
        async fn append(&self, _record: &VoteRecord) -> Result<(), StoreError> {
            std::future::pending().await
        }

        fn stream(&self) -> BoxStream<'_, Result<VoteRecord, StoreError>> {
            stream::pending::<Result<VoteRecord, StoreError>>().boxed()
        }

        fn kind(&self) -> &'static str {
            "hanging"
        }
    }

    fn credentials() -> CredentialSource {
        CredentialSource::JsonString(r#"{"type": "postgres", "host": "db.internal", "project_id": "party"}"#.into())
    }

    fn connected(repository: Arc<dyn VoteRepository>) -> (Arc<ConnectionResolver>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector = CountingConnector { calls: calls.clone(), repository: Some(repository) };
        let resolver = ConnectionResolver::new(Some(credentials()), Some(Box::new(connector)), SHORT);
        (Arc::new(resolver), calls)
    }

    fn offline_processor() -> VoteProcessor {
        VoteProcessor::new(Arc::new(ConnectionResolver::new(None, None, SHORT)), SHORT)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn vote(name: &str, properties: &[&str], wishes: &[&str], insider: &str) -> VoteRecord {
        VoteRecord::new(name, strings(properties), strings(wishes), insider)
    }

    fn flaky(total: usize, fail_after: usize) -> Arc<FlakyRepository> {
        let records = (0..total).map(|i| vote(&format!("Gast {}", i), &["witzig"], &[], "")).collect();
        Arc::new(FlakyRepository { records, fail_after })
    }

    #[tokio::test]
    async fn test_resolver_without_client_is_unavailable() {
        let resolver = ConnectionResolver::new(Some(credentials()), None, SHORT);
        assert!(matches!(
            resolver.resolve().await,
            ConnectionResult::Unavailable(UnavailableReason::ClientMissing)
        ));
        assert!(resolver.handle().await.is_none());
    }

    #[tokio::test]
    async fn test_resolver_without_textkey_skips_connector() {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector = CountingConnector { calls: calls.clone(), repository: None };
        let resolver = ConnectionResolver::new(None, Some(Box::new(connector)), SHORT);

        assert!(matches!(
            resolver.resolve().await,
            ConnectionResult::Unavailable(UnavailableReason::ConfigurationMissing)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolver_treats_blank_textkey_as_missing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector = CountingConnector { calls: calls.clone(), repository: None };
        let resolver = ConnectionResolver::new(
            Some(CredentialSource::JsonString(" \n".into())),
            Some(Box::new(connector)),
            SHORT,
        );

        assert!(matches!(
            resolver.resolve().await,
            ConnectionResult::Unavailable(UnavailableReason::ConfigurationMissing)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolver_reports_unreadable_credentials() {
        for raw in ["{not json", "[1, 2, 3]", r#"{"type": "postgres", "database": "party"}"#] {
            let calls = Arc::new(AtomicUsize::new(0));
            let connector = CountingConnector { calls: calls.clone(), repository: None };
            let resolver = ConnectionResolver::new(
                Some(CredentialSource::JsonString(raw.into())),
                Some(Box::new(connector)),
                SHORT,
            );

            assert!(
                matches!(resolver.resolve().await, ConnectionResult::Unavailable(UnavailableReason::CredentialParse(_))),
                "credentials {:?} should be rejected",
                raw
            );
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_credential_shapes_normalize_to_same_credentials() {
        let from_string = credentials().to_credentials().unwrap();

        let map = match json!({"type": "postgres", "host": "db.internal", "project_id": "party"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let from_map = CredentialSource::StructuredMap(map).to_credentials().unwrap();

        assert_eq!(from_string, from_map);
        assert_eq!(from_map.database.as_deref(), Some("party"));
        assert_eq!(from_map.kind.as_deref(), Some("postgres"));
    }

    #[test]
    fn test_credential_debug_hides_secrets() {
        let source = CredentialSource::JsonString(r#"{"host": "db", "password": "hunter2"}"#.into());
        assert!(!format!("{:?}", source).contains("hunter2"));
        assert!(!format!("{:?}", source.to_credentials().unwrap()).contains("hunter2"));
    }

    #[tokio::test]
    async fn test_resolver_memoizes_handle() {
        let (resolver, calls) = connected(Arc::new(EphemeralRepository::new()));

        let (first, second) = tokio::join!(resolver.handle(), resolver.handle());
        let third = resolver.handle().await;

        let first = first.expect("connected");
        assert!(first.same_as(&second.expect("connected")));
        assert!(first.same_as(&third.expect("connected")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolver_memoizes_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector = CountingConnector { calls: calls.clone(), repository: None };
        let resolver = ConnectionResolver::new(Some(credentials()), Some(Box::new(connector)), SHORT);

        for _ in 0..3 {
            assert!(matches!(
                resolver.resolve().await,
                ConnectionResult::Unavailable(UnavailableReason::Connection(_))
            ));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolver_times_out_hanging_connect() {
        let resolver = ConnectionResolver::new(Some(credentials()), Some(Box::new(HangingConnector)), SHORT);
        match resolver.resolve().await {
            ConnectionResult::Unavailable(UnavailableReason::Connection(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_offline_saves_land_in_memory_in_order() {
        let processor = offline_processor();
        let submitted = vec![
            vote("Anna", &["witzig"], &[], "spielt Schach"),
            vote("", &[], &["Weltreise"], ""),
            vote("Ben", &["klug", "witzig"], &["Ruhe"], "backt Brot"),
        ];

        for record in &submitted {
            assert!(!processor.save(record.clone()).await);
        }

        let snapshot = processor.load_all().await;
        assert_eq!(snapshot.records.len(), submitted.len());
        for (stored, sent) in snapshot.records.iter().zip(&submitted) {
            assert_eq!(stored.name, sent.name);
            assert_eq!(stored.properties, sent.properties);
            assert_eq!(stored.wishes, sent.wishes);
            assert_eq!(stored.insider, sent.insider);
            assert!(stored.timestamp.is_some());
        }
        assert_eq!(snapshot.properties, strings(&["witzig", "klug", "witzig"]));
        assert_eq!(snapshot.wishes, strings(&["Weltreise", "Ruhe"]));
        assert_eq!(snapshot.insider_notes, strings(&["spielt Schach", "backt Brot"]));
    }

    #[tokio::test]
    async fn test_connected_save_goes_remote_only() {
        let remote = Arc::new(EphemeralRepository::new());
        let (resolver, _) = connected(remote.clone());
        let processor = VoteProcessor::new(resolver, SHORT);

        assert!(processor.save(vote("Anna", &["witzig"], &[], "")).await);
        assert_eq!(remote.len(), 1);
        assert!(processor.ephemeral().is_empty());
        assert_eq!(processor.load_all().await.records.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_remote_append_is_not_retried_locally() {
        let (resolver, _) = connected(flaky(0, 0));
        let processor = VoteProcessor::new(resolver, SHORT);

        assert_eq!(processor.store(vote("Anna", &["witzig"], &[], "")).await, SaveOutcome::Dropped);
        assert!(!processor.save(vote("Ben", &[], &["Ruhe"], "")).await);
        assert!(processor.ephemeral().is_empty());
    }

    #[tokio::test]
    async fn test_hanging_remote_fails_closed() {
        let (resolver, _) = connected(Arc::new(HangingRepository));
        let processor = VoteProcessor::new(resolver, SHORT);

        assert_eq!(processor.store(vote("Anna", &["witzig"], &[], "")).await, SaveOutcome::Dropped);
        assert!(processor.load_all().await.records.is_empty());
        assert!(processor.ephemeral().is_empty());
    }

    #[tokio::test]
    async fn test_partial_read_keeps_records_before_failure() {
        let (resolver, _) = connected(flaky(5, 3));
        let processor = VoteProcessor::new(resolver, SHORT);

        let snapshot = processor.load_all().await;
        assert_eq!(snapshot.records.len(), 3);
        assert_eq!(snapshot.properties.len(), 3);
        assert_eq!(snapshot.records[2].name, "Gast 2");
    }

    #[tokio::test]
    async fn test_loaded_votes_rank_like_manual_count() {
        let processor = offline_processor();
        let pool = ["witzig", "herzlich", "klug", "mutig", "chaotisch", "laut", "ruhig"];
        let mut manual: HashMap<String, usize> = HashMap::new();

        for i in 0..30usize {
            let picks: Vec<&str> = pool.iter().enumerate()
                .filter(|(j, _)| i % (j + 1) == 0)
                .map(|(_, tag)| *tag)
                .collect();
            for tag in &picks {
                *manual.entry(tag.to_string()).or_insert(0) += 1;
            }
            processor.save(vote(&format!("Gast {}", i), &picks, &[], "")).await;
        }

        let summary = processor.summary().await;
        assert_eq!(summary.total_votes, 30);
        assert_eq!(
            tags_of(&summary.top_properties),
            strings(&["witzig", "herzlich", "klug", "mutig", "chaotisch"])
        );
        for entry in &summary.top_properties {
            assert_eq!(manual[&entry.tag], entry.count);
        }
    }

    #[tokio::test]
    async fn test_status_reports_degraded_mode() {
        let status = offline_processor().status().await;
        assert!(!status.online);
        assert_eq!(status.backend, "ephemeral");
        assert!(status.detail.is_some());

        let (resolver, _) = connected(Arc::new(EphemeralRepository::new()));
        let status = VoteProcessor::new(resolver, SHORT).status().await;
        assert!(status.online);
        assert!(status.detail.is_none());
    }

    #[test]
    fn test_prompt_contains_inputs_and_closing() {
        let rng = SystemRandom::new();
        let prompt = compose(
            &rng,
            &PromptInput {
                name: "Anna",
                age: 30,
                top_properties: &strings(&["witty", "kind"]),
                top_wishes: &strings(&["world peace"]),
                insider_notes: &strings(&["plays chess"]),
            },
            3,
        );

        for needle in ["Anna", "30", "witty, kind", "world peace", "plays chess"] {
            assert!(prompt.contains(needle), "{:?} missing from {:?}", needle, prompt);
        }
        assert!(prompt.ends_with(RHYME_DIRECTIVE));
    }

    #[test]
    fn test_prompt_without_notes_omits_details() {
        let rng = SystemRandom::new();
        let prompt = compose(
            &rng,
            &PromptInput { name: "Bea", age: 41, top_properties: &[], top_wishes: &[], insider_notes: &[] },
            3,
        );
        assert_eq!(prompt, "Gedicht für Bea (41). Eigenschaften: . Wünsche: . Reimschema AABB.");
    }

    #[test]
    fn test_sample_notes_without_replacement() {
        let rng = SystemRandom::new();
        let notes: Vec<String> = (0..10).map(|i| format!("note {}", i)).collect();

        for _ in 0..50 {
            let picked = sample_notes(&rng, &notes, 3);
            assert_eq!(picked.len(), 3);
            assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 3);
            assert!(picked.iter().all(|note| notes.iter().any(|n| n == note)));
        }

        let few = strings(&["a", "b"]);
        let mut all = sample_notes(&rng, &few, 3);
        all.sort();
        assert_eq!(all, vec!["a", "b"]);
        assert!(sample_notes(&rng, &few, 0).is_empty());
    }

    #[test]
    fn test_catalog_parses_and_groups() {
        let csv = "Typ,Kategorie,Text\n\
                   Eigenschaft,Charakter,witzig\n\
                   Wunsch,Reisen,Weltreise\n\
                   Eigenschaft,Charakter,herzlich\n\
                   Eigenschaft,Talente,kocht gut\n\
                   Sonstiges,Egal,ignoriert\n";
        let catalog = Catalog::parse(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 4);

        let view = catalog.view();
        assert_eq!(
            view.properties,
            vec![
                CategoryGroup { category: "Charakter".into(), options: strings(&["witzig", "herzlich"]) },
                CategoryGroup { category: "Talente".into(), options: strings(&["kocht gut"]) },
            ]
        );
        assert_eq!(view.wishes.len(), 1);
        assert_eq!(view.wishes[0].options, strings(&["Weltreise"]));
    }

    #[test]
    fn test_catalog_handles_latin1_and_semicolons() {
        let mut bytes = b"Typ;Kategorie;Text\nWunsch;Gl".to_vec();
        bytes.push(0xFC); // ü in Latin-1
        bytes.extend_from_slice(b"ck;Gesundheit, Gl");
        bytes.push(0xFC);
        bytes.extend_from_slice(b"ck\n");

        let catalog = Catalog::parse(&bytes).unwrap();
        assert_eq!(catalog.entries()[0].category, "Glück");
        assert_eq!(catalog.entries()[0].text, "Gesundheit, Glück");
        assert_eq!(catalog.entries()[0].kind, OptionKind::Wish);
    }

    #[test]
    fn test_missing_catalog_is_empty() {
        let catalog = Catalog::load(std::path::Path::new("/nonexistent/geburtstags_daten.csv"));
        assert!(catalog.is_empty());
        assert_eq!(catalog.view(), CatalogView::default());
    }

    #[test]
    fn test_config_reads_structured_textkey_and_secrets() {
        let figment = Figment::new()
            .merge(("textkey", json!({"host": "db.internal", "port": 5432})))
            .merge(("store_timeout_secs", 3));
        let config = AppConfig::from_figment(&figment).unwrap();

        assert!(matches!(config.textkey, Some(CredentialSource::StructuredMap(_))));
        assert_eq!(config.store_timeout(), Duration::from_secs(3));
        assert_eq!(config.admin_password, "party");
        let creds = config.textkey.as_ref().unwrap().to_credentials().unwrap();
        assert_eq!(creds.port, Some(5432));

        let secrets: HashMap<&str, &str> = HashMap::from([
            ("textkey", r#"{"host": "cloud"}"#),
            ("OPENAI_API_KEY", "sk-test"),
            ("ADMIN_PASSWORD", "geheim"),
        ]);
        let config = config.with_secrets(|key| secrets.get(key).map(|v| v.to_string()));
        assert!(matches!(config.textkey, Some(CredentialSource::JsonString(_))));
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.admin_password, "geheim");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let figment = Figment::new()
            .merge(("admin_password", "s3cret"))
            .merge(("store_timeout_secs", "ten"));
        assert!(AppConfig::from_figment(&figment).is_err());
    }

    #[test]
    fn test_blank_textkey_counts_as_not_configured() {
        let figment = Figment::new().merge(("textkey", "  "));
        let config = AppConfig::from_figment(&figment).unwrap();
        assert!(config.textkey.is_none());

        let config = config.with_secrets(|key| (key == "textkey").then(String::new));
        assert!(config.textkey.is_none());
    }

    #[test]
    fn test_admin_gate_and_basic_auth() {
        let header = format!("Basic {}", STANDARD.encode("host:party"));
        assert_eq!(basic_password(&header).as_deref(), Some("party"));
        assert_eq!(basic_password("Bearer abc"), None);
        assert_eq!(basic_password("Basic !!!"), None);

        let gate = AdminGate::new("party");
        assert!(gate.check("party"));
        assert!(!gate.check("Party"));
        assert!(!gate.check(""));
    }

    fn generator(api_key: Option<&str>) -> PoemGenerator {
        PoemGenerator::new("http://127.0.0.1:9/v1/chat/completions", "gpt-3.5-turbo", 0.8, api_key.map(String::from), SHORT)
            .unwrap()
    }

    #[test]
    fn test_generator_request_body() {
        let generator = generator(Some("sk-test"));
        let body = serde_json::to_value(generator.request_body("Gedicht für Anna")).unwrap();

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], POET_PERSONA);
        assert_eq!(body["messages"][1]["content"], "Gedicht für Anna");
        assert!((body["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_generator_requires_api_key() {
        let generator = generator(Some("   "));
        assert!(!generator.has_api_key());
        assert!(matches!(
            generator.generate("prompt", None).await,
            Err(GenerationError::MissingApiKey)
        ));
    }

    #[test]
    fn test_service_error_hides_upstream_body() {
        let error = ApiError::from(GenerationError::Service {
            status: 429,
            body: r#"{"error": "quota for org-123 exceeded"}"#.into(),
        });
        let message = error.to_string();
        assert!(message.starts_with("Generation failed"));
        assert!(message.contains("429"));
        assert!(!message.contains("org-123"));
    }

    async fn client() -> Client {
        let config = AppConfig::default();
        let resolver = Arc::new(ConnectionResolver::new(None, None, SHORT));
        let catalog = Catalog::parse(b"Typ,Kategorie,Text\nEigenschaft,Charakter,witzig\nWunsch,Reisen,Weltreise\n").unwrap();
        let state = AppState::new(&config, resolver, catalog, generator(None));
        Client::tracked(crate::build_rocket(state, &config)).await.expect("valid rocket instance")
    }

    fn admin_auth(password: &str) -> Header<'static> {
        Header::new("Authorization", format!("Basic {}", STANDARD.encode(format!("host:{}", password))))
    }

    #[rocket::async_test]
    async fn test_submit_rejects_empty_vote() {
        let client = client().await;
        let response = client.post("/api/votes")
            .header(ContentType::JSON)
            .json(&SubmitVoteRequest { name: "Anna".into(), ..Default::default() })
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        let body = response.into_json::<ErrorResponse>().await.unwrap();
        assert_eq!(body.code, ErrorCode::ValidationFailed);

        let summary = client.get("/api/admin/summary").header(admin_auth("party")).dispatch().await;
        assert_eq!(summary.into_json::<VoteSummary>().await.unwrap().total_votes, 0);
    }

    #[rocket::async_test]
    async fn test_submit_rejects_options_outside_catalog() {
        let client = client().await;
        let response = client.post("/api/votes")
            .header(ContentType::JSON)
            .json(&json!({"properties": ["SPAM", "SPAM", "SPAM"]}))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        let body = response.into_json::<ErrorResponse>().await.unwrap();
        assert_eq!(body.code, ErrorCode::ValidationFailed);
        assert!(body.error.contains("SPAM"));

        // a wish is not accepted as a property
        let response = client.post("/api/votes")
            .header(ContentType::JSON)
            .json(&json!({"properties": ["Weltreise"]}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client.post("/api/votes")
            .header(ContentType::JSON)
            .json(&json!({"properties": ["witzig", "witzig", "witzig"]}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let summary = client.get("/api/admin/summary").header(admin_auth("party")).dispatch().await;
        let summary = summary.into_json::<VoteSummary>().await.unwrap();
        assert_eq!(summary.total_votes, 1);
        assert_eq!(summary.top_properties, vec![TagCount { tag: "witzig".into(), count: 1 }]);
    }

    #[rocket::async_test]
    async fn test_submit_then_summarize() {
        let client = client().await;
        let response = client.post("/api/votes")
            .header(ContentType::JSON)
            .json(&SubmitVoteRequest {
                name: "Anna".into(),
                properties: strings(&["witzig"]),
                wishes: strings(&["Weltreise"]),
                insider: "spielt Schach".into(),
            })
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let saved = response.into_json::<SubmitVoteResponse>().await.unwrap();
        assert!(!saved.stored_remotely);

        let response = client.get("/api/admin/summary").header(admin_auth("party")).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let summary = response.into_json::<VoteSummary>().await.unwrap();
        assert_eq!(summary.total_votes, 1);
        assert_eq!(summary.top_properties, vec![TagCount { tag: "witzig".into(), count: 1 }]);
        assert_eq!(summary.insider_notes, strings(&["spielt Schach"]));

        let response = client.get("/api/admin/votes").header(admin_auth("party")).dispatch().await;
        let records = response.into_json::<Vec<VoteRecord>>().await.unwrap();
        assert_eq!(records[0].name, "Anna");

        let response = client.post("/api/admin/prompt")
            .header(ContentType::JSON)
            .header(admin_auth("party"))
            .json(&PromptRequest { name: "Anna".into(), age: 30 })
            .dispatch()
            .await;
        let prompt = response.into_json::<PromptResponse>().await.unwrap().prompt;
        assert!(prompt.contains("Gedicht für Anna (30)"));
        assert!(prompt.contains("Details: spielt Schach."));
    }

    #[rocket::async_test]
    async fn test_admin_routes_require_password() {
        let client = client().await;

        let response = client.get("/api/admin/summary").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
        let body = response.into_json::<ErrorResponse>().await.unwrap();
        assert_eq!(body.code, ErrorCode::Unauthorized);

        let response = client.get("/api/admin/session").header(admin_auth("wrong")).dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);

        let response = client.get("/api/admin/session").header(admin_auth("party")).dispatch().await;
        assert_eq!(response.status(), Status::NoContent);
    }

    #[rocket::async_test]
    async fn test_poem_without_key_reports_generation_failure() {
        let client = client().await;
        let response = client.post("/api/admin/poem")
            .header(ContentType::JSON)
            .header(admin_auth("party"))
            .json(&json!({"name": "Anna", "age": 30}))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        let body = response.into_json::<ErrorResponse>().await.unwrap();
        assert_eq!(body.code, ErrorCode::GenerationFailed);
    }

    #[rocket::async_test]
    async fn test_status_and_options() {
        let client = client().await;

        let status = client.get("/api/status").dispatch().await.into_json::<StoreStatus>().await.unwrap();
        assert!(!status.online);

        let view = client.get("/api/options").dispatch().await.into_json::<CatalogView>().await.unwrap();
        assert_eq!(view.properties[0].options, strings(&["witzig"]));
        assert_eq!(view.wishes[0].options, strings(&["Weltreise"]));
    }
}
