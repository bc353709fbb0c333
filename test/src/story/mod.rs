/// Story-mode remote procedures, registered the way a game mode would
/// register them with the session

use meadow_shared::{ArgKind, ProcedureRegistry, RpcArg, RpcCall, RpcTarget};

use crate::test_world::TestWorld;

pub const CHANGE_FOOD: &str = "ChangeFood";
pub const ADD_MUSHROOM_COUNTER: &str = "AddMushroomCounter";
pub const REINFORCE_KARMA: &str = "ReinforceKarma";
pub const MOVE_PLAYERS_TO_WIN_SCREEN: &str = "MovePlayersToWinScreen";
pub const GO_TO_WIN_SCREEN: &str = "GoToWinScreen";

const QUARTERS_PER_PIP: i32 = 4;
const MUSHROOM_DURATION: i32 = 320;

/// The live game session a story procedure acts on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoryGame {
    pub food_in_stomach: i32,
    pub quarter_food_points: i32,
    pub max_food: i32,
    pub mushroom_counter: i32,
    pub reinforced_karma: bool,
    pub has_sheltered: bool,
    pub last_den_pos: String,
    pub den_position: String,
    /// Set once the cycle is won, holding whether the players starved
    pub won_malnourished: Option<bool>,
}

impl StoryGame {
    pub fn new(max_food: i32) -> Self {
        Self {
            food_in_stomach: 0,
            quarter_food_points: 0,
            max_food,
            mushroom_counter: 0,
            reinforced_karma: false,
            has_sheltered: false,
            last_den_pos: String::new(),
            den_position: String::new(),
            won_malnourished: None,
        }
    }

    /// Food in quarter pips
    pub fn food_points(&self) -> i32 {
        self.food_in_stomach * QUARTERS_PER_PIP + self.quarter_food_points
    }

    pub fn change_food(&mut self, amount: i16) {
        let food = (self.food_points() + i32::from(amount))
            .clamp(0, self.max_food * QUARTERS_PER_PIP);
        self.food_in_stomach = food / QUARTERS_PER_PIP;
        self.quarter_food_points = food % QUARTERS_PER_PIP;
    }

    pub fn is_won(&self) -> bool {
        self.won_malnourished.is_some()
    }

    /// Wins the cycle. A player who already sheltered keeps their own den.
    fn win(&mut self, malnourished: bool, den_pos: &str) -> String {
        let den = if self.has_sheltered {
            self.last_den_pos.clone()
        } else {
            self.last_den_pos = den_pos.to_string();
            den_pos.to_string()
        };
        self.den_position = den.clone();
        self.won_malnourished = Some(malnourished);
        den
    }
}

pub fn story_procedures() -> ProcedureRegistry<TestWorld> {
    let mut registry = ProcedureRegistry::builder();
    registry
        .register(CHANGE_FOOD, &[ArgKind::I16], change_food)
        .register(ADD_MUSHROOM_COUNTER, &[], add_mushroom_counter)
        .register(REINFORCE_KARMA, &[], reinforce_karma)
        .register(
            MOVE_PLAYERS_TO_WIN_SCREEN,
            &[ArgKind::Bool, ArgKind::Str],
            move_players_to_win_screen,
        )
        .register(
            GO_TO_WIN_SCREEN,
            &[ArgKind::Bool, ArgKind::Str],
            go_to_win_screen,
        );
    registry
}

fn change_food(call: &mut RpcCall, world: &mut TestWorld) {
    let Some(game) = world.game.as_mut() else {
        return;
    };
    if let Some(amount) = call.arg(0).and_then(RpcArg::as_i16) {
        game.change_food(amount);
    }
}

fn add_mushroom_counter(_: &mut RpcCall, world: &mut TestWorld) {
    if let Some(game) = world.game.as_mut() {
        game.mushroom_counter += MUSHROOM_DURATION;
    }
}

fn reinforce_karma(_: &mut RpcCall, world: &mut TestWorld) {
    if let Some(game) = world.game.as_mut() {
        game.reinforced_karma = true;
    }
}

fn win_args(call: &RpcCall) -> (bool, String) {
    let malnourished = call.arg(0).and_then(RpcArg::as_bool).unwrap_or(false);
    let den_pos = call.arg(1).and_then(RpcArg::as_str).unwrap_or_default();
    (malnourished, den_pos.to_string())
}

/// Runs on the lobby owner, which wins and sends everyone else along
fn move_players_to_win_screen(call: &mut RpcCall, world: &mut TestWorld) {
    let Some(game) = world.game.as_mut() else {
        return;
    };
    if game.is_won() {
        return;
    }
    let (malnourished, den_pos) = win_args(call);
    let den = game.win(malnourished, &den_pos);
    call.invoke_once(
        RpcTarget::Broadcast,
        GO_TO_WIN_SCREEN,
        vec![RpcArg::Bool(malnourished), RpcArg::Str(den)],
    );
}

fn go_to_win_screen(call: &mut RpcCall, world: &mut TestWorld) {
    let Some(game) = world.game.as_mut() else {
        return;
    };
    if game.is_won() {
        return;
    }
    let (malnourished, den_pos) = win_args(call);
    game.win(malnourished, &den_pos);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn food_is_clamped_to_the_stomach() {
        let mut game = StoryGame::new(7);
        game.change_food(5);
        assert_eq!((game.food_in_stomach, game.quarter_food_points), (1, 1));

        game.change_food(-10);
        assert_eq!(game.food_points(), 0);

        game.change_food(i16::MAX);
        assert_eq!((game.food_in_stomach, game.quarter_food_points), (7, 0));
    }

    #[test]
    fn sheltered_players_keep_their_den() {
        let mut game = StoryGame::new(7);
        game.has_sheltered = true;
        game.last_den_pos = "SU_S01".to_string();

        assert_eq!(game.win(false, "SU_S04"), "SU_S01");
        assert_eq!(game.den_position, "SU_S01");
        assert_eq!(game.won_malnourished, Some(false));
    }
}
