use smsf_core::Error;
use smsf_llm::{parse_chat_response, ChatRequest, TEMPERATURE};

#[test]
fn request_is_pinned_to_zero_temperature() {
    let req = ChatRequest::user("gpt-4.1-mini", "Hi there");
    let json = serde_json::to_value(&req).expect("serialize");
    assert_eq!(TEMPERATURE, 0.0);
    assert_eq!(json["temperature"], serde_json::json!(0.0));
    assert_eq!(json["model"], "gpt-4.1-mini");
    assert_eq!(json["messages"][0]["role"], "user");
    assert_eq!(json["messages"][0]["content"], "Hi there");
}

#[test]
fn first_choice_text_is_returned() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"s 67A SIS Act permits it."}},{"message":{"content":"other"}}]}"#;
    assert_eq!(parse_chat_response(body).expect("text"), "s 67A SIS Act permits it.");
}

#[test]
fn empty_or_missing_text_is_an_error() {
    for body in [r#"{"choices":[]}"#, r#"{"choices":[{"message":{"content":"  "}}]}"#, r#"{"choices":[{"message":{"content":null}}]}"#, "not json"] {
        assert!(matches!(parse_chat_response(body), Err(Error::LanguageModel(_))), "{body}");
    }
}
