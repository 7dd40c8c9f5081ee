//! Property-based tests for the input-context state machine.
//!
//! Random key sequences, then structural invariants after every step.

use proptest::prelude::*;

use super::*;
use crate::types::key;

#[derive(Debug, Clone)]
enum Action {
    TypeLetter(char),
    TypeDigit(char),
    Space,
    Tab,
    Escape,
    Backspace,
    Return,
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    ToggleEnglish,
    TogglePredict,
    CtrlChord(char),
    HostReset,
    FocusChange,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        24 => prop::sample::select("niahowxceqgjt".chars().collect::<Vec<_>>())
            .prop_map(Action::TypeLetter),
        4 => prop::sample::select("1234567890".chars().collect::<Vec<_>>())
            .prop_map(Action::TypeDigit),
        6 => Just(Action::Space),
        5 => Just(Action::Tab),
        4 => Just(Action::Escape),
        6 => Just(Action::Backspace),
        4 => Just(Action::Return),
        3 => Just(Action::ArrowUp),
        3 => Just(Action::ArrowDown),
        2 => Just(Action::PageUp),
        2 => Just(Action::PageDown),
        2 => Just(Action::ToggleEnglish),
        2 => Just(Action::TogglePredict),
        2 => prop::sample::select("acvz".chars().collect::<Vec<_>>())
            .prop_map(Action::CtrlChord),
        1 => Just(Action::HostReset),
        1 => Just(Action::FocusChange),
    ]
}

fn apply(context: &mut InputContext, action: &Action) -> Option<KeyOutcome> {
    let event = match action {
        Action::TypeLetter(c) | Action::TypeDigit(c) => KeyEvent::chr(*c),
        Action::Space => KeyEvent::plain(key::SPACE),
        Action::Tab => KeyEvent::plain(key::TAB),
        Action::Escape => KeyEvent::plain(key::ESCAPE),
        Action::Backspace => KeyEvent::plain(key::BACKSPACE),
        Action::Return => KeyEvent::plain(key::RETURN),
        Action::ArrowUp => KeyEvent::plain(key::UP),
        Action::ArrowDown => KeyEvent::plain(key::DOWN),
        Action::PageUp => KeyEvent::plain(key::PAGE_UP),
        Action::PageDown => KeyEvent::plain(key::PAGE_DOWN),
        Action::ToggleEnglish => KeyEvent::ctrl(key::SPACE),
        Action::TogglePredict => KeyEvent::ctrl(key::SEMICOLON),
        Action::CtrlChord(c) => KeyEvent::ctrl(*c as u32),
        Action::HostReset => {
            context.on_host_reset();
            return None;
        }
        Action::FocusChange => {
            context.reset();
            return None;
        }
    };
    Some(context.handle_key(event))
}

fn check_invariants(context: &InputContext, outcome: &Option<KeyOutcome>) {
    let candidates = context.merged_candidates();

    // Candidates: deduped, capped, only while composing.
    assert!(candidates.len() <= 5);
    for (i, candidate) in candidates.iter().enumerate() {
        assert!(!candidates[..i].contains(candidate));
    }
    if !candidates.is_empty() {
        assert!(context.is_composing());
    }

    // A ghost is never shown while the buffer is non-empty.
    assert!(!(context.is_composing() && !context.ghost_text().is_empty()));

    // The buffer never holds anything outside [a-zA-Z'].
    assert!(context
        .buffer_text()
        .bytes()
        .all(|b| b.is_ascii_alphabetic() || b == b'\''));

    // Commits are never empty strings, and a commit implies the key was eaten.
    if let Some(outcome) = outcome {
        if let Some(commit) = &outcome.commit {
            assert!(!commit.is_empty());
            assert!(outcome.eaten);
        }
    }

    // UI snapshot stays coherent with the state.
    let ui = context.ui_state();
    assert_eq!(
        ui.active,
        context.is_composing() || !context.ghost_text().is_empty() || !candidates.is_empty()
    );
    if let Some(page) = &ui.candidates {
        assert!(!page.entries.is_empty());
        assert!(page.cursor < page.entries.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(192))]

    #[test]
    fn invariants_hold_under_random_input(actions in prop::collection::vec(arb_action(), 1..48)) {
        let client = StubClient::always(ghost_result("下一步", 0.9));
        let mut context = make_context(client);
        context.update_surrounding("你好世界".as_bytes(), 4, true);

        for action in &actions {
            let outcome = apply(&mut context, action);
            check_invariants(&context, &outcome);
        }
    }

    #[test]
    fn silent_daemon_never_shows_ghost(actions in prop::collection::vec(arb_action(), 1..32)) {
        let client = StubClient::silent();
        let mut context = make_context(client);
        context.update_surrounding("你好世界".as_bytes(), 4, true);

        for action in &actions {
            let outcome = apply(&mut context, action);
            check_invariants(&context, &outcome);
            assert!(context.ghost_text().is_empty());
        }
    }
}
