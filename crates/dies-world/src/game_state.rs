use dies_core::{
    DiesInstant, FieldGeometry, GameState, GameStateType, RefCommand, RefereeMsg, Vector2,
    WorldSettings,
};

/// A restart waiting for the ball to be played.
#[derive(Debug, Clone, Copy)]
struct PendingRestart {
    ball_pos: Vector2,
    since: DiesInstant,
}

/// Derives the game state from referee commands and ball movement.
#[derive(Debug, Clone)]
pub struct GameStateCalculator {
    game_state: GameState,
    last_command_counter: Option<u32>,
    restart: Option<PendingRestart>,
    restart_ball_move_distance: f64,
    free_kick_timeout: f64,
    ball_out_margin: f64,
    field: FieldGeometry,
}

impl GameStateCalculator {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            game_state: GameState::default(),
            last_command_counter: None,
            restart: None,
            restart_ball_move_distance: settings.restart_ball_move_distance,
            free_kick_timeout: settings.free_kick_timeout,
            ball_out_margin: settings.ball_out_margin,
            field: settings.field.clone(),
        }
    }

    pub fn update_settings(&mut self, settings: &WorldSettings) {
        self.restart_ball_move_distance = settings.restart_ball_move_distance;
        self.free_kick_timeout = settings.free_kick_timeout;
        self.ball_out_margin = settings.ball_out_margin;
        self.field = settings.field.clone();
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Compute the game state of the current frame.
    ///
    /// A referee message with a new command counter is applied immediately. A
    /// repeated counter leaves the referee-driven state untouched; only the ball
    /// can move the state on (restart taken, ball left the field).
    pub fn next_game_state(
        &mut self,
        referee_msg: Option<&RefereeMsg>,
        ball_pos: Vector2,
        now: DiesInstant,
    ) -> GameState {
        match referee_msg {
            Some(msg) if self.last_command_counter != Some(msg.command_counter) => {
                self.last_command_counter = Some(msg.command_counter);
                self.apply_command(msg, ball_pos, now);
            }
            _ => self.progress_restart(ball_pos, now),
        }
        self.check_ball_left_field(ball_pos);
        self.game_state.clone()
    }

    fn apply_command(&mut self, msg: &RefereeMsg, ball_pos: Vector2, now: DiesInstant) {
        let last_state = self.game_state.state_type;
        let state_type = match msg.command {
            RefCommand::Halt => GameStateType::Halt,
            RefCommand::Stop => GameStateType::Stop,
            RefCommand::NormalStart => match last_state {
                GameStateType::PrepareKickoff => GameStateType::Kickoff,
                GameStateType::PreparePenalty => GameStateType::Penalty,
                _ => GameStateType::Run,
            },
            RefCommand::ForceStart => GameStateType::Run,
            RefCommand::PrepareKickoffYellow | RefCommand::PrepareKickoffBlue => {
                GameStateType::PrepareKickoff
            }
            RefCommand::PreparePenaltyYellow | RefCommand::PreparePenaltyBlue => {
                GameStateType::PreparePenalty
            }
            RefCommand::DirectFreeYellow
            | RefCommand::DirectFreeBlue
            | RefCommand::IndirectFreeYellow
            | RefCommand::IndirectFreeBlue => GameStateType::FreeKick,
            RefCommand::TimeoutYellow | RefCommand::TimeoutBlue => GameStateType::Timeout,
            RefCommand::BallPlacementYellow | RefCommand::BallPlacementBlue => {
                match msg.designated_position {
                    Some(pos) => GameStateType::BallPlacement(pos),
                    None => {
                        log::error!("No position for ball placement");
                        last_state
                    }
                }
            }
            RefCommand::GoalYellow | RefCommand::GoalBlue => last_state,
        };

        let operating_team = match msg.command {
            RefCommand::GoalYellow | RefCommand::GoalBlue => self.game_state.operating_team,
            command => command.team().or(self.game_state.operating_team),
        };
        self.game_state = GameState {
            state_type,
            operating_team: match state_type {
                GameStateType::Halt
                | GameStateType::Stop
                | GameStateType::Timeout
                | GameStateType::Run => None,
                _ => operating_team,
            },
        };

        self.restart = match state_type {
            GameStateType::Kickoff | GameStateType::FreeKick | GameStateType::Penalty => {
                Some(PendingRestart {
                    ball_pos,
                    since: now,
                })
            }
            _ => None,
        };

        log::info!(
            "Referee command {:?} ({}): {} -> {}",
            msg.command,
            msg.command_counter,
            last_state,
            state_type
        );
    }

    fn progress_restart(&mut self, ball_pos: Vector2, now: DiesInstant) {
        let Some(restart) = self.restart else {
            return;
        };

        let moved = (ball_pos - restart.ball_pos).norm() > self.restart_ball_move_distance;
        let timed_out = now.duration_since(&restart.since) >= self.free_kick_timeout;
        let next = match self.game_state.state_type {
            GameStateType::Kickoff | GameStateType::FreeKick if moved || timed_out => {
                GameStateType::Run
            }
            GameStateType::Penalty if moved => GameStateType::PenaltyRun,
            _ => return,
        };

        log::info!("Restart taken: {} -> {}", self.game_state.state_type, next);
        self.restart = None;
        self.game_state.state_type = next;
        if next == GameStateType::Run {
            self.game_state.operating_team = None;
        }
    }

    fn check_ball_left_field(&mut self, ball_pos: Vector2) {
        let in_play = matches!(
            self.game_state.state_type,
            GameStateType::Run
                | GameStateType::Kickoff
                | GameStateType::FreeKick
                | GameStateType::PenaltyRun
        );
        if !in_play || !ball_pos.iter().all(|v| v.is_finite()) {
            return;
        }
        if !self.field.is_in_field(ball_pos, self.ball_out_margin) {
            log::info!("Ball left the field at {:?}", ball_pos);
            self.restart = None;
            self.game_state.state_type = GameStateType::BallLeftField(ball_pos);
        }
    }

    /// Forget everything, back to the state before the first referee message.
    pub fn reset(&mut self) {
        self.game_state = GameState::default();
        self.last_command_counter = None;
        self.restart = None;
    }
}
