//! Club-search flow: age → branch → direction → club card.

use crate::catalog::{Branch, ClubRecord, distinct_directions, filter_clubs};
use crate::engine::action::{Choice, Keyboard, OutboundAction};
use crate::engine::event::{Callback, Sender};
use crate::engine::session::{ClubSearchState, FlowState};
use crate::engine::{ConversationEngine, menu, prepend_ack};

const AGE_PROMPT: &str = "Подберём кружок! Сколько лет ребёнку? Введите возраст числом.";
const AGE_INVALID: &str = "Возраст должен быть целым числом, например 7. Попробуйте ещё раз.";
const BRANCH_PROMPT: &str = "Отлично! В каком филиале вам удобно заниматься?";
const DIRECTION_PROMPT: &str = "Какое направление интересует?";
const CLUB_PROMPT: &str = "Вот что подходит. Выберите кружок:";
const NOT_FOUND: &str = "К сожалению, по вашему запросу ничего не нашлось. Попробуйте другой возраст или филиал.";

impl ConversationEngine {
    pub(crate) async fn start_club_search(&self, sender: &Sender) -> Vec<OutboundAction> {
        self.sessions()
            .set(sender.id, FlowState::ClubSearch(ClubSearchState::AwaitingAge))
            .await;
        vec![OutboundAction::text(sender.id, AGE_PROMPT)]
    }

    /// Age step: a non-negative integer, re-prompt in place otherwise.
    pub(crate) async fn club_age_input(&self, sender: &Sender, text: &str) -> Vec<OutboundAction> {
        let Ok(age) = text.parse::<u32>() else {
            return vec![OutboundAction::text(sender.id, AGE_INVALID)];
        };
        self.sessions()
            .set(
                sender.id,
                FlowState::ClubSearch(ClubSearchState::AwaitingBranch { age }),
            )
            .await;

        let kb = Keyboard::new()
            .column(
                Branch::ALL
                    .into_iter()
                    .map(|b| Choice::new(b.title(), Callback::Branch(b))),
            )
            .with_home();
        vec![OutboundAction::with_keyboard(sender.id, BRANCH_PROMPT, kb)]
    }

    /// Branch step: filter the catalog by age and branch, then offer the
    /// distinct directions of the result.
    pub(crate) async fn club_choose_branch(
        &self,
        sender: &Sender,
        callback_id: &str,
        branch: Branch,
    ) -> Vec<OutboundAction> {
        let FlowState::ClubSearch(ClubSearchState::AwaitingBranch { age }) =
            self.sessions().get(sender.id).await
        else {
            return self.stale_choice(sender, callback_id).await;
        };

        let clubs = match self.store.list_clubs().await {
            Ok(clubs) => clubs,
            Err(e) => {
                return vec![
                    OutboundAction::ack(callback_id),
                    self.store_failure(sender, &e),
                ];
            }
        };

        let matches = filter_clubs(&clubs, age, branch);
        if matches.is_empty() {
            self.sessions().clear(sender.id).await;
            return prepend_ack(
                callback_id.to_string(),
                vec![OutboundAction::with_keyboard(
                    sender.id,
                    NOT_FOUND,
                    menu::main_menu(self.is_admin(sender.id)),
                )],
            );
        }

        let directions = distinct_directions(&matches);
        let kb = Keyboard::new()
            .column(
                directions
                    .iter()
                    .enumerate()
                    .map(|(i, d)| Choice::new(d.clone(), Callback::Direction(i))),
            )
            .with_home();

        self.sessions()
            .set(
                sender.id,
                FlowState::ClubSearch(ClubSearchState::AwaitingDirection {
                    age,
                    branch,
                    matches,
                    directions,
                }),
            )
            .await;
        prepend_ack(
            callback_id.to_string(),
            vec![OutboundAction::with_keyboard(sender.id, DIRECTION_PROMPT, kb)],
        )
    }

    /// Direction step: narrow the snapshot to one direction.
    pub(crate) async fn club_choose_direction(
        &self,
        sender: &Sender,
        callback_id: &str,
        index: usize,
    ) -> Vec<OutboundAction> {
        let FlowState::ClubSearch(ClubSearchState::AwaitingDirection {
            matches,
            directions,
            ..
        }) = self.sessions().get(sender.id).await
        else {
            return self.stale_choice(sender, callback_id).await;
        };
        let Some(direction) = directions.get(index) else {
            return self.stale_choice(sender, callback_id).await;
        };

        let narrowed: Vec<ClubRecord> = matches
            .iter()
            .filter(|c| c.direction == *direction)
            .cloned()
            .collect();
        let kb = Keyboard::new()
            .column(
                narrowed
                    .iter()
                    .enumerate()
                    .map(|(i, c)| Choice::new(c.name.clone(), Callback::Club(i))),
            )
            .with_home();

        self.sessions()
            .set(
                sender.id,
                FlowState::ClubSearch(ClubSearchState::AwaitingClub { matches: narrowed }),
            )
            .await;
        prepend_ack(
            callback_id.to_string(),
            vec![OutboundAction::with_keyboard(sender.id, CLUB_PROMPT, kb)],
        )
    }

    /// Final step: render the club card and return to idle.
    pub(crate) async fn club_choose_club(
        &self,
        sender: &Sender,
        callback_id: &str,
        index: usize,
    ) -> Vec<OutboundAction> {
        let FlowState::ClubSearch(ClubSearchState::AwaitingClub { matches }) =
            self.sessions().get(sender.id).await
        else {
            return self.stale_choice(sender, callback_id).await;
        };
        let Some(club) = matches.get(index) else {
            return self.stale_choice(sender, callback_id).await;
        };

        let card = club_card(club);
        self.sessions().clear(sender.id).await;
        prepend_ack(
            callback_id.to_string(),
            vec![OutboundAction::with_keyboard(
                sender.id,
                card,
                menu::main_menu(self.is_admin(sender.id)),
            )],
        )
    }
}

fn club_card(club: &ClubRecord) -> String {
    let address = if club.address.trim().is_empty() {
        "Онлайн"
    } else {
        club.address.as_str()
    };
    format!(
        "«{}»\nНаправление: {}\nВозраст: {}\nПреподаватель: {}\nАдрес: {}\nСсылка: {}",
        club.name, club.direction, club.age_range, club.teacher, address, club.link
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_shows_online_for_blank_address() {
        let club = ClubRecord {
            direction: "IT".into(),
            name: "Scratch".into(),
            age_range: "7+".into(),
            address: "  ".into(),
            teacher: "И. И. Иванова".into(),
            link: "https://example.org".into(),
        };
        let card = club_card(&club);
        assert!(card.contains("Адрес: Онлайн"));
        assert!(card.contains("Scratch"));
        assert!(card.contains("7+"));
    }
}
