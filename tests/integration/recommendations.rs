//! Advisory replies and recommendation execution

use assert_matches::assert_matches;
use hostwatch::api::{ChatReply, RiskLevel};
use hostwatch::console::{CANCELLED, ChatAnswer, Panel};
use hostwatch::projection::{Tone, overview_question};
use hostwatch::{ConsoleError, TriggerOutcome, View, codec};
use pretty_assertions::assert_eq;

use crate::helpers::*;

async fn console_with_advice() -> (std::sync::Arc<FakeApi>, hostwatch::ConsoleHandle) {
    let api = FakeApi::new();
    api.set_reply(Ok(ChatReply::Structured(advice())));

    let console = spawn_console(test_config(), &api);
    console.select_host("h1").await.unwrap();
    wait_for(&console, |state| state.overview_advice.ready().is_some()).await;

    (api, console)
}

#[tokio::test]
async fn test_overview_asks_question_matching_load() {
    let (api, console) = console_with_advice().await;

    // Disk is at 85 %
    let question = overview_question(&online_snapshot("h1"));
    assert_eq!(api.count(&format!("ask h1 {question}")), 1);

    let state = console.state();
    let advice = state.overview_advice.ready().unwrap();
    assert_eq!(advice.summary, "Disk is almost full");

    let [bound, manual, advisory] = advice.recommendations.as_slice() else {
        panic!("expected three recommendations");
    };

    assert_eq!(bound.risk, RiskLevel::Red);
    assert_eq!(bound.tone, Tone::Danger);
    assert!(bound.is_clickable());
    assert_eq!(bound.command, None);

    assert!(manual.is_clickable());
    assert_eq!(manual.command.as_deref(), Some("apt-get clean"));

    assert!(!advisory.is_clickable());
    assert_eq!(advisory.risk, RiskLevel::Yellow);
    assert_eq!(advisory.token, None);

    // Presented recommendations wait idle
    for id in advice.execution_ids() {
        assert_eq!(state.execution(id).unwrap().phase, "idle");
    }
}

#[tokio::test]
async fn test_tokens_carry_the_recommendation() {
    let (_api, console) = console_with_advice().await;

    let state = console.state();
    let advice = state.overview_advice.ready().unwrap();
    let token = advice.recommendations[0].token.as_ref().unwrap();

    let decoded = codec::decode(token).unwrap();
    assert_eq!(decoded.action_id.as_deref(), Some("restart_nginx"));
    assert_eq!(decoded.title.as_deref(), Some("Restart web server"));
}

#[tokio::test]
async fn test_manual_recommendation_makes_no_call() {
    let (api, console) = console_with_advice().await;

    let id = console.state().overview_advice.ready().unwrap().recommendations[1]
        .execution
        .unwrap();

    assert_eq!(
        console.trigger_recommendation(id).await.unwrap(),
        TriggerOutcome::Manual(id)
    );

    let state = console.state();
    let execution = state.execution(id).unwrap();
    assert_eq!(execution.phase, "manual");
    assert_eq!(execution.label, "Manual Action Required");
    assert_eq!(execution.detail.as_deref(), Some("apt-get clean"));
    assert_eq!(execution.title, "Clear apt cache");

    settle().await;
    assert_eq!(api.count("run_action"), 0);

    // Already terminal
    assert_eq!(
        console.trigger_recommendation(id).await.unwrap(),
        TriggerOutcome::Ignored
    );
}

#[tokio::test]
async fn test_bound_recommendation_runs_its_action() {
    let (api, console) = console_with_advice().await;
    api.set_action_result("restart_nginx", Ok(success("restarted")));

    let id = console.state().overview_advice.ready().unwrap().recommendations[0]
        .execution
        .unwrap();

    assert_eq!(
        console.trigger_recommendation(id).await.unwrap(),
        TriggerOutcome::Running(id)
    );
    assert_eq!(
        console.trigger_recommendation(id).await.unwrap(),
        TriggerOutcome::Ignored
    );

    let state = wait_for(&console, |state| {
        state
            .execution(id)
            .is_some_and(|execution| execution.phase == "succeeded")
    })
    .await;

    assert_eq!(state.execution(id).unwrap().detail.as_deref(), Some("restarted"));
    assert_eq!(api.count("run_action h1 restart_nginx"), 1);
}

#[tokio::test]
async fn test_replaced_advice_discards_its_executions() {
    let (api, console) = console_with_advice().await;

    let old: Vec<_> = console
        .state()
        .overview_advice
        .ready()
        .unwrap()
        .execution_ids()
        .collect();
    assert_eq!(old.len(), 2);

    console.refresh_advice().await.unwrap();
    let state = wait_for(&console, |state| state.overview_advice.ready().is_some()).await;

    for id in &old {
        assert!(state.execution(*id).is_none());
    }
    assert_eq!(state.executions.len(), 2);
    assert_eq!(api.count("ask h1"), 2);
}

#[tokio::test]
async fn test_text_reply_leaves_overview_unavailable() {
    let api = FakeApi::new();
    api.set_reply(Ok(ChatReply::Text("Everything looks fine".to_string())));

    let console = spawn_console(test_config(), &api);
    console.select_host("h1").await.unwrap();

    let state = wait_for(&console, |state| {
        matches!(state.overview_advice, Panel::Unavailable(_))
    })
    .await;

    assert_matches!(
        &state.overview_advice,
        Panel::Unavailable(message) if message.starts_with("Unable to generate recommendations")
    );
    assert!(state.executions.is_empty());
}

#[tokio::test]
async fn test_advice_failure_is_reported() {
    let api = FakeApi::new();
    api.set_reply(Err(ConsoleError::Application("AI unavailable".to_string())));

    let console = spawn_console(test_config(), &api);
    console.select_host("h1").await.unwrap();

    let state = wait_for(&console, |state| {
        matches!(state.overview_advice, Panel::Failed(_))
    })
    .await;

    assert_eq!(
        state.overview_advice,
        Panel::Failed("Error loading recommendations: AI unavailable".to_string())
    );
}

#[tokio::test]
async fn test_chat_records_question_and_answer() {
    let api = FakeApi::new();
    api.set_reply(Ok(ChatReply::Text("Nginx is using most of the CPU".to_string())));

    let console = spawn_console(test_config(), &api);
    console.switch_view(View::Chat).await.unwrap();
    console.select_host("h1").await.unwrap();

    console.ask("   ").await.unwrap();
    assert!(console.state().chat.is_empty());

    console.ask("Why is the CPU busy?").await.unwrap();
    let state = wait_for(&console, |state| {
        state
            .chat
            .first()
            .is_some_and(|entry| entry.answer != ChatAnswer::Pending)
    })
    .await;

    assert_eq!(state.chat.len(), 1);
    assert_eq!(state.chat[0].question, "Why is the CPU busy?");
    assert_eq!(
        state.chat[0].answer,
        ChatAnswer::Text("Nginx is using most of the CPU".to_string())
    );
    assert_eq!(api.count("ask h1 Why is the CPU busy?"), 1);

    // Chat belongs to the host
    console.select_host("h2").await.unwrap();
    assert!(console.state().chat.is_empty());
}

#[tokio::test]
async fn test_chat_advice_is_executable() {
    let api = FakeApi::new();
    api.set_reply(Ok(ChatReply::Structured(advice())));

    let console = spawn_console(test_config(), &api);
    console.switch_view(View::Chat).await.unwrap();
    console.select_host("h1").await.unwrap();
    console.ask("What should I clean up?").await.unwrap();

    let state = wait_for(&console, |state| {
        state
            .chat
            .first()
            .is_some_and(|entry| entry.answer != ChatAnswer::Pending)
    })
    .await;

    let advice = assert_matches!(&state.chat[0].answer, ChatAnswer::Advice(advice) => advice);
    let id = advice.recommendations[1].execution.unwrap();

    assert_eq!(
        console.trigger_recommendation(id).await.unwrap(),
        TriggerOutcome::Manual(id)
    );
}

#[tokio::test]
async fn test_reselecting_host_settles_pending_requests() {
    let api = FakeApi::new();
    api.set_reply(Ok(ChatReply::Text("Nginx is busy".to_string())));
    let gate = api.hold_advice();

    let console = spawn_console(test_config(), &api);
    console.switch_view(View::Chat).await.unwrap();
    console.select_host("h1").await.unwrap();

    console.analyze().await.unwrap();
    console.ask("why?").await.unwrap();

    let state = console.state();
    assert!(state.analysis.is_loading());
    assert_eq!(state.chat[0].answer, ChatAnswer::Pending);

    console.select_host("h1").await.unwrap();

    let state = console.state();
    assert_eq!(state.analysis, Panel::Empty);
    assert_eq!(state.chat.len(), 1);
    assert_eq!(state.chat[0].answer, ChatAnswer::Failed(CANCELLED.to_string()));

    // The old replies arrive with a stale generation and change nothing
    release(&gate);
    settle().await;

    let state = console.state();
    assert_eq!(api.count("analyze h1"), 1);
    assert_eq!(api.count("ask h1 why?"), 1);
    assert_eq!(state.analysis, Panel::Empty);
    assert_eq!(state.chat[0].answer, ChatAnswer::Failed(CANCELLED.to_string()));

    // A fresh question is answered normally
    console.ask("why now?").await.unwrap();
    let state = wait_for(&console, |state| {
        state
            .chat
            .get(1)
            .is_some_and(|entry| entry.answer != ChatAnswer::Pending)
    })
    .await;
    assert_eq!(state.chat[1].answer, ChatAnswer::Text("Nginx is busy".to_string()));
}
