//! End-to-end turn flow through a session with a scripted gateway.

use std::sync::Arc;

use parley_config::schema::ParleyConfig;
use parley_core::{NextSpeaker, Part, Role, Turn};
use parley_gateway::MockGateway;
use parley_session::{ChatSession, SessionRegistry};

fn session_with(gateway: MockGateway, config: &ParleyConfig) -> ChatSession {
    ChatSession::new(Arc::new(gateway), config)
}

#[tokio::test]
async fn multi_step_task_continues_until_classifier_says_done() {
    // Turn 1: model reports progress, classifier votes model.
    // Turn 2: model finishes, classifier votes user.
    let gateway = MockGateway::new()
        .with_text_turn("Reading sales.xlsx now.")
        .with_text_turn(r#"{"reasoning": "still working", "next_speaker": "model"}"#)
        .with_text_turn("Done: total revenue is 412k.")
        .with_text_turn(r#"{"reasoning": "final answer given", "next_speaker": "user"}"#);

    let mut session = session_with(gateway, &ParleyConfig::default());

    let first = session.submit("total revenue in sales.xlsx?", true).await.unwrap();
    assert!(first.should_continue);

    let second = session.submit_continue().await.unwrap();
    assert!(!second.should_continue);
    assert_eq!(
        second.decision.unwrap().next_speaker,
        NextSpeaker::User
    );

    // user, model, "Please continue.", model
    assert_eq!(session.transcript().len(), 4);
    assert_eq!(
        session.transcript().turns()[2].text_content(),
        "Please continue."
    );
}

#[tokio::test]
async fn function_call_turn_never_auto_continues() {
    let gateway = MockGateway::new().with_function_call(
        "compute_statistics",
        serde_json::json!({"column": "price"}),
    );
    let mut session = session_with(gateway.clone(), &ParleyConfig::default());

    let outcome = session.submit("stats for the price column", true).await.unwrap();
    assert!(!outcome.should_continue);
    let decision = outcome.decision.unwrap();
    assert_eq!(decision.next_speaker, NextSpeaker::Model);
    assert!(!decision.should_continue);

    // Structural rule, no classification call: one gateway request total.
    assert_eq!(gateway.request_count(), 1);
}

#[tokio::test]
async fn thought_only_turn_counts_as_blank_and_continues() {
    let turn = Turn::new(
        Role::Model,
        vec![Part::Thought { text: "   ".into() }],
    );
    let gateway = MockGateway::new().with_turn(turn);
    let mut session = session_with(gateway, &ParleyConfig::default());

    let outcome = session.submit("hello", true).await.unwrap();
    assert!(outcome.should_continue);
    assert_eq!(outcome.decision.unwrap().next_speaker, NextSpeaker::Model);
}

#[tokio::test]
async fn classifier_gibberish_degrades_to_user() {
    let gateway = MockGateway::new()
        .with_text_turn("Here is your chart.")
        .with_text_turn("next speaker should be... hmm");
    let mut session = session_with(gateway, &ParleyConfig::default());

    let outcome = session.submit("plot revenue", true).await.unwrap();
    assert!(!outcome.should_continue);
    let decision = outcome.decision.unwrap();
    assert_eq!(decision.next_speaker, NextSpeaker::User);
    assert_eq!(
        decision.reasoning,
        "Failed to parse next speaker detection response"
    );
}

#[tokio::test]
async fn turn_budget_exhausts_across_registry_session() {
    let gateway = MockGateway::new()
        .with_text_turn("step")
        .with_text_turn(r#"{"reasoning": "go on", "next_speaker": "model"}"#)
        .with_text_turn("step")
        .with_text_turn(r#"{"reasoning": "go on", "next_speaker": "model"}"#)
        .with_text_turn("step");

    let mut config = ParleyConfig::default();
    config.agent.max_session_turns = 3;

    let registry = SessionRegistry::new(Arc::new(gateway), config);
    let (_, session) = registry.get_or_create(None).await;
    let mut session = session.lock().await;

    assert!(session.submit("go", true).await.unwrap().should_continue);
    assert!(session.submit_continue().await.unwrap().should_continue);

    let last = session.submit_continue().await.unwrap();
    assert!(!last.should_continue);
    assert_eq!(
        last.decision.unwrap().reasoning,
        "Maximum session turns reached"
    );
}

#[tokio::test]
async fn classifier_sees_check_prompt_without_tools() {
    let mut config = ParleyConfig::default();
    config.agent.tools = vec![parley_core::FunctionDecl {
        name: "compute_statistics".into(),
        description: "Summary statistics for a column".into(),
        parameters: serde_json::json!({"type": "object"}),
    }];

    let gateway = MockGateway::new()
        .with_text_turn("All done.")
        .with_text_turn(r#"{"reasoning": "complete", "next_speaker": "user"}"#);
    let mut session = session_with(gateway.clone(), &config);

    session.submit("hi", true).await.unwrap();

    let requests = gateway.requests();
    assert_eq!(requests.len(), 2);

    // Primary call carries the tool declarations.
    assert_eq!(requests[0].1.tools.len(), 1);
    assert!(requests[0].1.include_thoughts);

    // Side call carries none, is token-capped, and ends with the check prompt.
    let (classifier_transcript, classifier_config) = &requests[1];
    assert!(classifier_config.tools.is_empty());
    assert!(!classifier_config.include_thoughts);
    assert_eq!(classifier_config.max_output_tokens, Some(200));
    assert!(
        classifier_transcript
            .last()
            .unwrap()
            .text_content()
            .contains("determine who should speak next")
    );
}
