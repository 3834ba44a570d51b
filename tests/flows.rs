//! End-to-end conversation flow tests against an in-memory catalog.

use std::sync::Arc;

use viktor_bot::catalog::{
    ACTIVITIES, Branch, CatalogStore, ClubRecord, MasterclassRecord, MemoryCatalogStore,
};
use viktor_bot::config::EngineConfig;
use viktor_bot::engine::{
    Callback, ConversationEngine, InboundEvent, MenuItem, OutboundAction, Sender,
};

const ADMIN_ID: i64 = 99;
const USER_ID: i64 = 1;

fn club(direction: &str, name: &str, age_range: &str, address: &str) -> ClubRecord {
    ClubRecord {
        direction: direction.into(),
        name: name.into(),
        age_range: age_range.into(),
        address: address.into(),
        teacher: "И. И. Иванова".into(),
        link: "https://example.org/club".into(),
    }
}

fn masterclass(title: &str) -> MasterclassRecord {
    MasterclassRecord {
        title: title.into(),
        description: "Описание".into(),
        date: "12 марта".into(),
        price: "1500 ₽".into(),
        teacher: "А. П. Петрова".into(),
        link: "https://example.org/mc".into(),
    }
}

fn engine_with(
    clubs: Vec<ClubRecord>,
    masterclasses: Vec<MasterclassRecord>,
) -> (ConversationEngine, Arc<MemoryCatalogStore>) {
    let store = Arc::new(MemoryCatalogStore::new(clubs, masterclasses));
    let config = EngineConfig {
        admin_id: ADMIN_ID,
        ..EngineConfig::default()
    };
    let engine = ConversationEngine::new(store.clone() as Arc<dyn CatalogStore>, config);
    (engine, store)
}

fn text_event(user: i64, text: &str) -> InboundEvent {
    InboundEvent::Text {
        sender: Sender::new(user, "Тест"),
        text: text.into(),
    }
}

fn choice_event(user: i64, token: Callback) -> InboundEvent {
    InboundEvent::Choice {
        sender: Sender::new(user, "Тест"),
        callback_id: "cb".into(),
        message_id: 1,
        token,
    }
}

/// All texts sent to the given chat, joined for substring assertions.
fn texts_to(actions: &[OutboundAction], chat_id: i64) -> String {
    actions
        .iter()
        .filter_map(|a| match a {
            OutboundAction::SendText {
                chat_id: c, text, ..
            } if *c == chat_id => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

fn has_alert(actions: &[OutboundAction]) -> bool {
    actions.iter().any(|a| {
        matches!(
            a,
            OutboundAction::Acknowledge {
                alert: Some(_),
                ..
            }
        )
    })
}

// ── Club search ─────────────────────────────────────────────────────

#[tokio::test]
async fn club_search_reaches_card_and_clears_session() {
    let (engine, _) = engine_with(
        vec![
            club("Арт", "Керамика", "6-8", "ул. Садовая, 5"),
            club("Спорт", "Самбо", "7+", "ул. Садовая, 5"),
            club("IT", "Scratch", "7-10", ""),
        ],
        vec![],
    );

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Clubs)))
        .await;
    engine.handle_event(text_event(USER_ID, "7")).await;
    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::Branch(Branch::Sadovaya)))
        .await;
    // Both Арт and Спорт match age 7 at Садовая.
    let directions = texts_to(&actions, USER_ID);
    assert!(directions.contains("направление"), "{directions}");

    engine
        .handle_event(choice_event(USER_ID, Callback::Direction(0)))
        .await;
    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::Club(0)))
        .await;

    let card = texts_to(&actions, USER_ID);
    assert!(card.contains("Керамика"), "{card}");
    assert!(card.contains("6-8"));
    assert!(card.contains("И. И. Иванова"));
    assert!(card.contains("ул. Садовая, 5"));
    assert!(card.contains("https://example.org/club"));
    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn club_search_bad_age_reprompts_in_place() {
    let (engine, _) = engine_with(vec![club("Арт", "Керамика", "6-8", "")], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Clubs)))
        .await;
    let actions = engine.handle_event(text_event(USER_ID, "семь")).await;
    assert!(texts_to(&actions, USER_ID).contains("числом"));

    // Still awaiting the age: a valid age now advances to branches.
    let actions = engine.handle_event(text_event(USER_ID, "7")).await;
    assert!(texts_to(&actions, USER_ID).contains("филиал"));
}

#[tokio::test]
async fn club_search_empty_result_aborts_to_menu() {
    let (engine, _) = engine_with(vec![club("Арт", "Керамика", "6-8", "ул. Садовая, 5")], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Clubs)))
        .await;
    engine.handle_event(text_event(USER_ID, "15")).await;
    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::Branch(Branch::Sadovaya)))
        .await;

    assert!(texts_to(&actions, USER_ID).contains("ничего не нашлось"));
    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn stale_club_index_apologizes_and_resets() {
    let (engine, _) = engine_with(vec![club("Арт", "Керамика", "6-8", "ул. Садовая, 5")], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Clubs)))
        .await;
    engine.handle_event(text_event(USER_ID, "7")).await;
    engine
        .handle_event(choice_event(USER_ID, Callback::Branch(Branch::Sadovaya)))
        .await;
    engine
        .handle_event(choice_event(USER_ID, Callback::Direction(0)))
        .await;

    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::Club(42)))
        .await;
    assert!(texts_to(&actions, USER_ID).contains("неактуальна"));
    assert_eq!(engine.sessions().active_count().await, 0);
}

// ── Package booking ─────────────────────────────────────────────────

#[tokio::test]
async fn package_flow_prices_one_activity_for_five_people() {
    let (engine, _) = engine_with(vec![], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Packages)))
        .await;
    engine.handle_event(text_event(USER_ID, "5")).await;
    engine
        .handle_event(choice_event(USER_ID, Callback::Activity(0)))
        .await;
    engine
        .handle_event(choice_event(USER_ID, Callback::ActivitiesDone))
        .await;
    engine.handle_event(text_event(USER_ID, "Мария")).await;
    let actions = engine
        .handle_event(text_event(USER_ID, "+7 900 000-00-00"))
        .await;

    // Керамика alone, tier 0: 2200 per person, 11000 total.
    let confirmation = texts_to(&actions, USER_ID);
    assert!(confirmation.contains("2200"), "{confirmation}");
    assert!(confirmation.contains("11000"), "{confirmation}");

    let admin_note = texts_to(&actions, ADMIN_ID);
    assert!(admin_note.contains("Мария"));
    assert!(admin_note.contains("+7 900 000-00-00"));
    assert!(admin_note.contains(ACTIVITIES[0].name));

    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn package_rejects_small_groups() {
    let (engine, _) = engine_with(vec![], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Packages)))
        .await;
    let actions = engine.handle_event(text_event(USER_ID, "4")).await;
    assert!(texts_to(&actions, USER_ID).contains("не меньше 5"));

    let actions = engine.handle_event(text_event(USER_ID, "5")).await;
    assert!(texts_to(&actions, USER_ID).contains("активност"));
}

#[tokio::test]
async fn toggling_same_activity_twice_unselects() {
    let (engine, _) = engine_with(vec![], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Packages)))
        .await;
    engine.handle_event(text_event(USER_ID, "6")).await;
    engine
        .handle_event(choice_event(USER_ID, Callback::Activity(1)))
        .await;
    engine
        .handle_event(choice_event(USER_ID, Callback::Activity(1)))
        .await;

    // Selection is empty again, so "done" is refused with an alert.
    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::ActivitiesDone))
        .await;
    assert!(has_alert(&actions));
}

#[tokio::test]
async fn fourth_activity_rejected_without_mutating_selection() {
    let (engine, _) = engine_with(vec![], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Packages)))
        .await;
    engine.handle_event(text_event(USER_ID, "5")).await;
    for i in 0..3 {
        engine
            .handle_event(choice_event(USER_ID, Callback::Activity(i)))
            .await;
    }

    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::Activity(3)))
        .await;
    assert!(has_alert(&actions));

    // The original three are still selected: done advances and the final
    // quote uses the three-activity tier.
    engine
        .handle_event(choice_event(USER_ID, Callback::ActivitiesDone))
        .await;
    engine.handle_event(text_event(USER_ID, "Пётр")).await;
    let actions = engine.handle_event(text_event(USER_ID, "123456")).await;

    let per_person: u32 = (0..3).map(|i| ACTIVITIES[i].tier_prices[2]).sum();
    assert!(texts_to(&actions, USER_ID).contains(&per_person.to_string()));
}

// ── Masterclass enrollment ──────────────────────────────────────────

#[tokio::test]
async fn enrollment_notifies_admin_and_clears_session() {
    let (engine, _) = engine_with(vec![], vec![masterclass("Керамика")]);

    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Masterclasses)))
        .await;
    assert!(texts_to(&actions, USER_ID).contains("мастер-классы"));

    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::Masterclass(0)))
        .await;
    assert!(texts_to(&actions, USER_ID).contains("1500 ₽"));

    engine
        .handle_event(choice_event(USER_ID, Callback::Enroll(0)))
        .await;
    engine.handle_event(text_event(USER_ID, "Иван")).await;
    let actions = engine.handle_event(text_event(USER_ID, "555-35-35")).await;

    let admin_note = texts_to(&actions, ADMIN_ID);
    assert!(admin_note.contains("Керамика"));
    assert!(admin_note.contains("Иван"));
    assert!(admin_note.contains("555-35-35"));
    assert!(texts_to(&actions, USER_ID).contains("записаны"));
    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn stale_masterclass_index_apologizes() {
    let (engine, _) = engine_with(vec![], vec![masterclass("Единственный")]);

    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::Masterclass(7)))
        .await;
    assert!(texts_to(&actions, USER_ID).contains("неактуальна"));
}

// ── Support ─────────────────────────────────────────────────────────

#[tokio::test]
async fn support_message_forwarded_verbatim() {
    let (engine, _) = engine_with(vec![], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Support)))
        .await;
    let actions = engine
        .handle_event(text_event(USER_ID, "Когда откроется бассейн?"))
        .await;

    let forwarded = texts_to(&actions, ADMIN_ID);
    assert!(forwarded.contains("Когда откроется бассейн?"));
    assert!(forwarded.contains("Тест"));
    assert!(forwarded.contains(&USER_ID.to_string()));
    assert!(texts_to(&actions, USER_ID).contains("отправлен в поддержку"));
    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn support_button_text_still_works() {
    let (engine, _) = engine_with(vec![], vec![]);

    let actions = engine
        .handle_event(text_event(USER_ID, "Написать в поддержку"))
        .await;
    assert!(texts_to(&actions, USER_ID).contains("передам"));
}

// ── Admin maintenance ───────────────────────────────────────────────

#[tokio::test]
async fn non_admin_cannot_enter_admin_flows_or_mutate_store() {
    let (engine, store) = engine_with(vec![], vec![masterclass("Охраняемый")]);

    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::AdminAdd))
        .await;
    assert!(has_alert(&actions));
    assert_eq!(engine.sessions().active_count().await, 0);

    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::AdminDelete))
        .await;
    assert!(has_alert(&actions));

    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::ConfirmDelete(0)))
        .await;
    assert!(has_alert(&actions));

    let actions = engine.handle_event(text_event(USER_ID, "/admin")).await;
    assert!(texts_to(&actions, USER_ID).contains("не администратор"));

    assert_eq!(store.list_masterclasses().await.unwrap().len(), 1);
}

#[tokio::test]
async fn admin_adds_masterclass_with_all_fields() {
    let (engine, store) = engine_with(vec![], vec![]);

    let actions = engine.handle_event(text_event(ADMIN_ID, "/admin")).await;
    assert!(texts_to(&actions, ADMIN_ID).contains("админ-панели"));

    engine
        .handle_event(choice_event(ADMIN_ID, Callback::AdminAdd))
        .await;
    for field in [
        "Гончарное дело",
        "Крутим круг",
        "1 июня",
        "2000 ₽",
        "В. В. Смирнов",
        "https://example.org/new",
    ] {
        engine.handle_event(text_event(ADMIN_ID, field)).await;
    }

    let records = store.list_masterclasses().await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.title, "Гончарное дело");
    assert_eq!(record.description, "Крутим круг");
    assert_eq!(record.date, "1 июня");
    assert_eq!(record.price, "2000 ₽");
    assert_eq!(record.teacher, "В. В. Смирнов");
    assert_eq!(record.link, "https://example.org/new");
    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn admin_add_rejects_empty_fields() {
    let (engine, store) = engine_with(vec![], vec![]);

    engine
        .handle_event(choice_event(ADMIN_ID, Callback::AdminAdd))
        .await;
    let actions = engine.handle_event(text_event(ADMIN_ID, "   ")).await;
    assert!(texts_to(&actions, ADMIN_ID).contains("пустым"));
    assert!(store.list_masterclasses().await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_deletes_exactly_the_confirmed_record() {
    let (engine, store) = engine_with(
        vec![],
        vec![masterclass("Первый"), masterclass("Второй"), masterclass("Третий")],
    );

    engine
        .handle_event(choice_event(ADMIN_ID, Callback::AdminDelete))
        .await;
    let actions = engine
        .handle_event(choice_event(ADMIN_ID, Callback::Delete(1)))
        .await;
    assert!(texts_to(&actions, ADMIN_ID).contains("Удалить «Второй»?"));

    let actions = engine
        .handle_event(choice_event(ADMIN_ID, Callback::ConfirmDelete(1)))
        .await;
    assert!(texts_to(&actions, ADMIN_ID).contains("удалён"));

    let remaining = store.list_masterclasses().await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].title, "Первый");
    assert_eq!(remaining[1].title, "Третий");
    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn confirm_is_cancelled_when_record_at_index_changed() {
    let (engine, store) = engine_with(
        vec![],
        vec![masterclass("Первый"), masterclass("Второй"), masterclass("Третий")],
    );

    engine
        .handle_event(choice_event(ADMIN_ID, Callback::AdminDelete))
        .await;
    engine
        .handle_event(choice_event(ADMIN_ID, Callback::Delete(1)))
        .await;

    // A concurrent write shifts the collection: index 1 now names
    // «Третий», not the confirmed «Второй».
    store.delete_masterclass(0).await.unwrap();

    let actions = engine
        .handle_event(choice_event(ADMIN_ID, Callback::ConfirmDelete(1)))
        .await;
    assert!(texts_to(&actions, ADMIN_ID).contains("изменился"));

    let remaining = store.list_masterclasses().await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().any(|r| r.title == "Третий"));
    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn confirm_with_mismatched_index_is_stale() {
    let (engine, store) = engine_with(vec![], vec![masterclass("Один"), masterclass("Два")]);

    engine
        .handle_event(choice_event(ADMIN_ID, Callback::AdminDelete))
        .await;
    engine
        .handle_event(choice_event(ADMIN_ID, Callback::Delete(0)))
        .await;
    let actions = engine
        .handle_event(choice_event(ADMIN_ID, Callback::ConfirmDelete(1)))
        .await;

    assert!(texts_to(&actions, ADMIN_ID).contains("неактуальна"));
    assert_eq!(store.list_masterclasses().await.unwrap().len(), 2);
}

// ── Global behaviors ────────────────────────────────────────────────

#[tokio::test]
async fn start_clears_any_flow_and_greets() {
    let (engine, _) = engine_with(vec![], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Packages)))
        .await;
    let actions = engine.handle_event(text_event(USER_ID, "/start")).await;

    assert!(texts_to(&actions, USER_ID).contains("Бот Виктор"));
    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn main_menu_callback_discards_uncommitted_flow() {
    let (engine, _) = engine_with(vec![], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Clubs)))
        .await;
    engine.handle_event(text_event(USER_ID, "7")).await;
    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::MainMenu))
        .await;

    assert!(texts_to(&actions, USER_ID).contains("Выберите"));
    assert_eq!(engine.sessions().active_count().await, 0);
}

#[tokio::test]
async fn entering_new_flow_discards_previous_one() {
    let (engine, _) = engine_with(vec![], vec![]);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Clubs)))
        .await;
    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Packages)))
        .await;

    // The session is now in the package flow: an age-like reply is read
    // as a people count and rejected for being under the minimum.
    let actions = engine.handle_event(text_event(USER_ID, "4")).await;
    assert!(texts_to(&actions, USER_ID).contains("не меньше 5"));
}

#[tokio::test]
async fn store_failure_reports_error_and_keeps_session() {
    use async_trait::async_trait;
    use viktor_bot::error::StoreError;

    struct BrokenStore;

    #[async_trait]
    impl CatalogStore for BrokenStore {
        async fn list_clubs(&self) -> Result<Vec<ClubRecord>, StoreError> {
            Err(StoreError::Unavailable {
                path: "clubs.json".into(),
                reason: "no such file".into(),
            })
        }
        async fn list_masterclasses(&self) -> Result<Vec<MasterclassRecord>, StoreError> {
            Err(StoreError::Unavailable {
                path: "mc.json".into(),
                reason: "no such file".into(),
            })
        }
        async fn append_masterclass(&self, _: MasterclassRecord) -> Result<(), StoreError> {
            unreachable!("read-only failure store")
        }
        async fn delete_masterclass(&self, _: usize) -> Result<MasterclassRecord, StoreError> {
            unreachable!("read-only failure store")
        }
    }

    let config = EngineConfig {
        admin_id: ADMIN_ID,
        ..EngineConfig::default()
    };
    let engine = ConversationEngine::new(Arc::new(BrokenStore), config);

    engine
        .handle_event(choice_event(USER_ID, Callback::Menu(MenuItem::Clubs)))
        .await;
    engine.handle_event(text_event(USER_ID, "7")).await;
    let actions = engine
        .handle_event(choice_event(USER_ID, Callback::Branch(Branch::Online)))
        .await;

    assert!(texts_to(&actions, USER_ID).contains("пошло не так"));
    // Session still mid-flow: the user can retry the branch choice.
    assert_eq!(engine.sessions().active_count().await, 1);
}
