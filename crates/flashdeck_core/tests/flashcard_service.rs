mod common;

use common::{with_each_backend, ScriptedGenerator};
use flashdeck_core::{Difficulty, GenerationError, ServiceError};

#[test]
fn create_flashcard_requires_existing_user() {
    with_each_backend(&ScriptedGenerator::replying(""), |app| {
        let err = app
            .flashcards()
            .create_flashcard("ghost", "q", "a", Difficulty::Easy)
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound(_)));
        assert_eq!(app.flashcards().count_flashcards().unwrap(), 0);
    });
}

#[test]
fn cards_are_listed_per_user() {
    with_each_backend(&ScriptedGenerator::replying(""), |app| {
        let ann = app.users().create_user("a@b.com", "Ann").unwrap();
        let bob = app.users().create_user("bob@b.com", "Bob").unwrap();
        let cards = app.flashcards();

        let first = cards
            .create_flashcard(ann.id(), "2+2?", "4", Difficulty::Easy)
            .unwrap();
        cards
            .create_flashcard(ann.id(), "3*3?", "9", Difficulty::Medium)
            .unwrap();
        cards
            .create_flashcard(bob.id(), "0/0?", "undefined", Difficulty::Hard)
            .unwrap();

        let anns = cards.list_flashcards_for_user(ann.id()).unwrap();
        assert_eq!(anns.len(), 2);
        assert!(anns.iter().all(|card| card.user_id() == ann.id()));
        assert!(anns.contains(&first));
        assert!(cards.list_flashcards_for_user("nobody").unwrap().is_empty());
    });
}

#[test]
fn generate_flashcard_sends_fixed_request_and_stores_parsed_card() {
    let generator =
        ScriptedGenerator::replying("Here you go:\nFRONT: What owns a value? BACK: Its owner binding.");
    with_each_backend(&generator, |app| {
        let ann = app.users().create_user("a@b.com", "Ann").unwrap();

        let card = app
            .flashcards()
            .generate_flashcard(ann.id(), "ownership", Difficulty::Medium)
            .unwrap();
        assert_eq!(card.front(), "What owns a value?");
        assert_eq!(card.back(), "Its owner binding.");
        assert_eq!(card.difficulty(), Difficulty::Medium);
        assert_eq!(app.flashcards().get_flashcard(card.id()).unwrap(), card);

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, Some(500));
        assert_eq!(requests[0].temperature, Some(0.7));
        assert!(requests[0]
            .prompt
            .contains("about ownership at medium difficulty level"));
        assert!(requests[0].prompt.contains("FRONT: [front text] BACK: [back text]"));
    });
}

#[test]
fn generate_flashcard_for_missing_user_never_calls_generator() {
    let generator = ScriptedGenerator::replying("FRONT: q BACK: a");
    with_each_backend(&generator, |app| {
        assert!(matches!(
            app.flashcards()
                .generate_flashcard("ghost", "rust", Difficulty::Easy),
            Err(ServiceError::UserNotFound(_))
        ));
        assert!(generator.requests().is_empty());
    });
}

#[test]
fn unparseable_generation_stores_nothing() {
    with_each_backend(&ScriptedGenerator::replying("I cannot help with that."), |app| {
        let ann = app.users().create_user("a@b.com", "Ann").unwrap();
        assert!(matches!(
            app.flashcards()
                .generate_flashcard(ann.id(), "rust", Difficulty::Easy),
            Err(ServiceError::UnparseableGeneration)
        ));
        assert_eq!(app.flashcards().count_flashcards().unwrap(), 0);
    });
}

#[test]
fn generator_failure_is_propagated() {
    let generator = ScriptedGenerator::failing(GenerationError::Provider("quota".to_string()));
    with_each_backend(&generator, |app| {
        let ann = app.users().create_user("a@b.com", "Ann").unwrap();
        let err = app
            .flashcards()
            .generate_flashcard(ann.id(), "rust", Difficulty::Hard)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Generation(_)));
        assert!(err.to_string().contains("quota"));
    });
}

#[test]
fn card_updates_are_persisted() {
    with_each_backend(&ScriptedGenerator::replying(""), |app| {
        let ann = app.users().create_user("a@b.com", "Ann").unwrap();
        let cards = app.flashcards();
        let card = cards
            .create_flashcard(ann.id(), "q", "a", Difficulty::Easy)
            .unwrap();

        let edited = cards
            .update_flashcard_content(card.id(), "question", "answer")
            .unwrap();
        assert_eq!(edited.front(), "question");
        assert!(edited.updated_at().is_some());

        let harder = cards
            .update_flashcard_difficulty(card.id(), Difficulty::Hard)
            .unwrap();
        assert_eq!(harder.difficulty(), Difficulty::Hard);
        assert_eq!(harder.back(), "answer");
        assert_eq!(cards.get_flashcard(card.id()).unwrap(), harder);

        assert!(matches!(
            cards.update_flashcard_content(card.id(), "", "answer"),
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(cards.get_flashcard(card.id()).unwrap(), harder);
    });
}

#[test]
fn deleting_a_user_leaves_their_cards() {
    with_each_backend(&ScriptedGenerator::replying(""), |app| {
        let ann = app.users().create_user("a@b.com", "Ann").unwrap();
        let card = app
            .flashcards()
            .create_flashcard(ann.id(), "q", "a", Difficulty::Easy)
            .unwrap();

        app.users().delete_user(ann.id()).unwrap();
        assert_eq!(app.flashcards().get_flashcard(card.id()).unwrap(), card);

        app.flashcards().delete_flashcard(card.id()).unwrap();
        assert!(matches!(
            app.flashcards().delete_flashcard(card.id()),
            Err(ServiceError::FlashcardNotFound(_))
        ));
    });
}
