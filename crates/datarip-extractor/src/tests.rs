//! Full-flow tests for the extraction driver

#[cfg(test)]
mod tests {
    use crate::{
        ExtractionDriver, ExtractorConfig, ExtractorError, JobPhase, ProcessingState,
        SchemaCompiler,
    };
    use datarip_domain::{FieldSpec, Row, Schema, Table};
    use datarip_llm::MockProvider;
    use indexmap::IndexMap;
    use proptest::prelude::*;
    use serde_json::json;

    fn name_age_schema() -> Schema {
        let mut properties = IndexMap::new();
        properties.insert("name".to_string(), FieldSpec::typed("string"));
        properties.insert("age".to_string(), FieldSpec::typed("integer"));
        Schema::new(properties, vec!["name".to_string()]).unwrap()
    }

    fn people() -> Table {
        Table::new(
            vec!["id".to_string(), "text".to_string()],
            vec![
                Row::new().with("id", 1).with("text", "Alice is 30"),
                Row::new().with("id", 2).with("text", "Bob is 40"),
            ],
        )
    }

    fn people_provider() -> MockProvider {
        let provider = MockProvider::default();
        provider.add_response("Alice is 30", r#"{"name": "Alice", "age": 30}"#);
        provider.add_response("Bob is 40", r#"{"name": "Bob", "age": 40}"#);
        provider
    }

    fn driver(provider: &MockProvider) -> ExtractionDriver<MockProvider> {
        ExtractionDriver::new(provider.clone(), ExtractorConfig::default())
    }

    #[tokio::test]
    async fn test_alice_and_bob() {
        let provider = people_provider();
        let driver = driver(&provider);
        let table = people();

        let state = driver
            .start(&ProcessingState::idle(), &name_age_schema(), &table, "text", &table.columns)
            .unwrap();
        assert_eq!(state.total, 2);
        assert_eq!(state.completed, 0);

        let first = driver.step(&state).await;
        assert_eq!(first.state.completed, 1);
        assert_eq!(first.output.progress, 50);
        assert!(first.state.processing);
        assert_eq!(
            serde_json::to_value(&first.state.processed_rows[0]).unwrap(),
            json!({"id": 1, "text": "Alice is 30", "name": "Alice", "age": 30})
        );

        let second = driver.step(&first.state).await;
        assert_eq!(second.state.completed, 2);
        assert!(!second.state.processing);
        assert_eq!(second.output.progress, 100);
        assert_eq!(second.state.phase(), JobPhase::Completed);
        assert_eq!(
            second.state.columns.fields().collect::<Vec<_>>(),
            vec!["id", "text", "name", "age"]
        );
        assert_eq!(second.state.processed_rows[1].get("name").unwrap(), "Bob");

        // The input snapshots are untouched
        assert_eq!(state.completed, 0);
        assert_eq!(first.state.completed, 1);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_rows_leave_idle() {
        let provider = MockProvider::default();
        let idle = ProcessingState::idle();
        let empty = Table::new(vec!["text".to_string()], vec![]);

        let err = driver(&provider)
            .start(&idle, &name_age_schema(), &empty, "text", &empty.columns)
            .unwrap_err();
        assert!(matches!(err, ExtractorError::JobStart(_)));
        assert_eq!(idle.phase(), JobPhase::Idle);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_terminal_steps_are_idempotent() {
        let provider = people_provider();
        let driver = driver(&provider);
        let table = people();

        let mut state = driver
            .start(&ProcessingState::idle(), &name_age_schema(), &table, "text", &table.columns)
            .unwrap();
        for _ in 0..2 {
            state = driver.step(&state).await.state;
        }
        let calls = provider.call_count();

        let a = driver.step(&state).await;
        let b = driver.step(&a.state).await;
        assert_eq!(a.state, state);
        assert_eq!(b.state, state);
        assert_eq!(a.output, b.output);
        assert_eq!(b.output.progress, 100);
        assert_eq!(provider.call_count(), calls);
    }

    #[tokio::test]
    async fn test_halt_and_resume_retries_same_row() {
        let provider = people_provider();
        provider.add_error("Bob is 40");
        let driver = driver(&provider);
        let table = people();

        let state = driver
            .start(&ProcessingState::idle(), &name_age_schema(), &table, "text", &table.columns)
            .unwrap();
        let first = driver.step(&state).await;
        let failed = driver.step(&first.state).await;

        assert_eq!(failed.state.phase(), JobPhase::Halted);
        assert_eq!(failed.state.completed, 1);
        assert_eq!(failed.state.processed_rows, first.state.processed_rows);
        assert_eq!(failed.state.columns, first.state.columns);
        assert_eq!(failed.output.progress, 50);
        match failed.failure() {
            Some(ExtractorError::ExtractionItem { row_index, reason }) => {
                assert_eq!(row_index, 1);
                assert!(reason.contains("Mock error"));
            }
            other => panic!("unexpected failure: {:?}", other),
        }

        // Ticks on a halted job change nothing and call nobody
        let calls = provider.call_count();
        let idle_tick = driver.step(&failed.state).await;
        assert_eq!(idle_tick.state, failed.state);
        assert_eq!(provider.call_count(), calls);

        // Fix the provider and retry the same row
        let fixed = people_provider();
        let driver = ExtractionDriver::new(fixed.clone(), ExtractorConfig::default());
        let resumed = driver.resume(&failed.state).unwrap();
        assert!(resumed.processing);
        assert!(resumed.halted.is_none());

        let done = driver.step(&resumed).await;
        assert_eq!(done.state.phase(), JobPhase::Completed);
        assert_eq!(done.state.processed_rows[1].get("name").unwrap(), "Bob");
        assert_eq!(fixed.requests()[0].messages.last().unwrap().content, "Bob is 40");
    }

    #[tokio::test]
    async fn test_omitted_optional_field() {
        let provider = MockProvider::default();
        provider.add_response("Alice is 30", r#"{"name": "Alice"}"#);
        provider.add_response("Bob is 40", r#"{"name": "Bob"}"#);
        let driver = driver(&provider);
        let table = people();

        let mut state = driver
            .start(&ProcessingState::idle(), &name_age_schema(), &table, "text", &table.columns)
            .unwrap();
        while state.is_running() {
            state = driver.step(&state).await.state;
        }

        assert!(!state.processed_rows[0].contains("age"));
        assert!(!state.columns.contains("age"));
        assert_eq!(state.columns.fields().collect::<Vec<_>>(), vec!["id", "text", "name"]);
    }

    #[tokio::test]
    async fn test_extracted_value_overwrites_collision() {
        let provider = MockProvider::new(r#"{"text": "rewritten", "name": "Alice"}"#);
        let driver = driver(&provider);
        let table = people();

        let state = driver
            .start(&ProcessingState::idle(), &name_age_schema(), &table, "text", &table.columns)
            .unwrap();
        let tick = driver.step(&state).await;

        let row = &tick.state.processed_rows[0];
        assert_eq!(row.get("text").unwrap(), "rewritten");
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "text", "name"]);
        // No duplicate column for an existing key
        assert_eq!(tick.state.columns.len(), 3);
    }

    #[tokio::test]
    async fn test_new_columns_follow_response_order() {
        let provider = MockProvider::new(r#"{"zeta": 1, "alpha": 2}"#);
        let driver = driver(&provider);
        let table = people();

        let state = driver
            .start(&ProcessingState::idle(), &name_age_schema(), &table, "text", &[])
            .unwrap();
        let tick = driver.step(&state).await;
        assert_eq!(
            tick.state.columns.fields().collect::<Vec<_>>(),
            vec!["zeta", "alpha"]
        );
    }

    #[tokio::test]
    async fn test_persisted_snapshot_resumes() {
        let provider = people_provider();
        let driver = driver(&provider);
        let table = people();

        let state = driver
            .start(&ProcessingState::idle(), &name_age_schema(), &table, "text", &table.columns)
            .unwrap();
        let first = driver.step(&state).await;

        let restored = ProcessingState::from_json(&first.state.to_json().unwrap()).unwrap();
        assert_eq!(restored, first.state);

        let second = driver.step(&restored).await;
        assert_eq!(second.state.phase(), JobPhase::Completed);
        assert_eq!(second.state.job_id, state.job_id);
    }

    #[tokio::test]
    async fn test_compile_then_run() {
        let provider = people_provider();
        provider.add_response(
            "I need each person's name and age",
            "```json\n{'properties': {'name': {'type': 'string'}, 'age': {'type': 'integer', 'default': None}}, 'required': ['name']}\n```",
        );

        let schema = SchemaCompiler::new(provider.clone())
            .compile("I need each person's name and age")
            .await
            .unwrap();
        let driver = driver(&provider);
        let table = people();

        let mut state = driver
            .start(&ProcessingState::idle(), &schema, &table, "text", &table.columns)
            .unwrap();
        while state.is_running() {
            state = driver.step(&state).await.state;
        }
        assert_eq!(state.completed, 2);

        // The tool carries the compiled schema
        let request = &provider.requests()[1];
        assert_eq!(request.tool.as_deref(), Some("extraction_function"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_stepping_completes_in_order(
            texts in prop::collection::vec("[a-z]{1,8}", 1..12),
            keys in prop::collection::vec("[a-c]", 1..4),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let args: serde_json::Map<String, serde_json::Value> = keys
                .iter()
                .map(|k| (k.clone(), json!(k.len())))
                .collect();
            let provider = MockProvider::new(serde_json::Value::Object(args).to_string());
            let driver = driver(&provider);
            let table = Table::new(
                vec!["text".to_string()],
                texts.iter().map(|t| Row::new().with("text", t.as_str())).collect(),
            );

            let mut state = driver
                .start(&ProcessingState::idle(), &name_age_schema(), &table, "text", &table.columns)
                .unwrap();
            let mut prev_progress = 0u8;
            let mut prev_fields: Vec<String> = state.columns.fields().map(String::from).collect();

            // One extra tick exercises the terminal path
            for _ in 0..=texts.len() {
                let prev_completed = state.completed;
                let tick = runtime.block_on(driver.step(&state));

                prop_assert!(tick.state.completed >= prev_completed);
                prop_assert!(tick.output.progress >= prev_progress);
                prop_assert!(tick.state.validate().is_ok());
                for (i, field) in prev_fields.iter().enumerate() {
                    prop_assert_eq!(tick.state.columns.position(field), Some(i));
                }

                prev_progress = tick.output.progress;
                prev_fields = tick.state.columns.fields().map(String::from).collect();
                state = tick.state;
            }

            prop_assert_eq!(state.completed, texts.len());
            prop_assert_eq!(prev_progress, 100);
            for (row, text) in state.processed_rows.iter().zip(&texts) {
                prop_assert_eq!(row.get("text"), Some(&json!(text)));
            }
        }
    }
}
