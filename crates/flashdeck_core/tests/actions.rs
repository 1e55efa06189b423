mod common;

use common::{with_each_backend, ScriptedGenerator};
use flashdeck_core::actions::{
    create_flashcard, create_user, delete_user, generate_flashcard, get_user, list_flashcards,
    list_users, update_user, CreateFlashcardInput, CreateUserInput, GenerateFlashcardInput,
    UpdateUserInput,
};
use flashdeck_core::PageQuery;
use serde_json::json;

fn ann() -> CreateUserInput {
    CreateUserInput {
        email: "a@b.com".to_string(),
        name: "Ann".to_string(),
    }
}

#[test]
fn successful_action_serializes_data_without_error() {
    with_each_backend(&ScriptedGenerator::replying(""), |app| {
        let response = create_user(app, &ann());
        assert!(response.success);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["email"], json!("a@b.com"));
        assert!(value["data"]["createdAt"].is_i64());
        assert!(value["data"].get("updatedAt").is_none());
        assert!(value.get("error").is_none());
    });
}

#[test]
fn failures_become_error_envelopes() {
    with_each_backend(&ScriptedGenerator::replying(""), |app| {
        create_user(app, &ann());

        let duplicate = create_user(app, &ann());
        let value = serde_json::to_value(&duplicate).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "error": "user with this email already exists"})
        );

        let missing = get_user(app, "missing");
        assert!(!missing.success);
        assert_eq!(missing.error.as_deref(), Some("user not found"));

        let invalid = create_user(
            app,
            &CreateUserInput {
                email: "not-an-email".to_string(),
                name: "X".to_string(),
            },
        );
        assert!(!invalid.success);
        assert!(invalid.data.is_none());
    });
}

#[test]
fn user_actions_cover_the_full_lifecycle() {
    with_each_backend(&ScriptedGenerator::replying(""), |app| {
        let id = create_user(app, &ann()).data.unwrap().id;

        let updated = update_user(
            app,
            &UpdateUserInput {
                id: id.clone(),
                email: "c@d.com".to_string(),
                name: "Ann".to_string(),
            },
        );
        let updated = updated.data.unwrap();
        assert_eq!(updated.email, "c@d.com");
        assert!(updated.updated_at.is_some());

        let listed = list_users(app, &PageQuery::default()).data.unwrap();
        assert_eq!(listed, vec![updated]);

        let deleted = delete_user(app, &id);
        assert!(deleted.success);
        assert_eq!(deleted.message.as_deref(), Some("user deleted"));
        assert!(!delete_user(app, &id).success);
    });
}

#[test]
fn flashcard_actions_parse_difficulty_and_use_camel_case() {
    let generator = ScriptedGenerator::replying("FRONT: Capital of France? BACK: Paris");
    with_each_backend(&generator, |app| {
        let user_id = create_user(app, &ann()).data.unwrap().id;

        let bad = create_flashcard(
            app,
            &CreateFlashcardInput {
                user_id: user_id.clone(),
                front: "q".to_string(),
                back: "a".to_string(),
                difficulty: "extreme".to_string(),
            },
        );
        assert!(!bad.success);
        assert!(bad.error.unwrap().contains("invalid difficulty"));

        let generated = generate_flashcard(
            app,
            &GenerateFlashcardInput {
                user_id: user_id.clone(),
                topic: "geography".to_string(),
                difficulty: "easy".to_string(),
            },
        );
        let value = serde_json::to_value(&generated).unwrap();
        assert_eq!(value["data"]["userId"], json!(user_id));
        assert_eq!(value["data"]["front"], json!("Capital of France?"));
        assert_eq!(value["data"]["back"], json!("Paris"));
        assert_eq!(value["data"]["difficulty"], json!("easy"));

        let listed = list_flashcards(app, &user_id).data.unwrap();
        assert_eq!(listed.len(), 1);
    });
}

#[test]
fn inputs_deserialize_from_camel_case_json() {
    let input: GenerateFlashcardInput = serde_json::from_value(json!({
        "userId": "u1",
        "topic": "rust",
        "difficulty": "hard",
    }))
    .unwrap();
    assert_eq!(input.user_id, "u1");
    assert_eq!(input.difficulty, "hard");
}
