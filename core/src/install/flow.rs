/// Stages of one install run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Identifying,
    Fetching,
    Scanning,
    SelectingSkills,
    SelectingScope,
    SelectingMethod,
    Publishing,
    Done,
    Cancelled,
    Failed,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Done | State::Cancelled | State::Failed)
    }

    fn is_selection(self) -> bool {
        matches!(
            self,
            State::SelectingSkills | State::SelectingScope | State::SelectingMethod
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The current stage finished.
    Proceed,
    Back,
    Cancel,
    Fail,
}

/// Which selection stages put a question to the user in this run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Steps {
    pub skills: bool,
    pub scope: bool,
    pub method: bool,
}

impl Steps {
    fn is_interactive(&self, state: State) -> bool {
        match state {
            State::SelectingSkills => self.skills,
            State::SelectingScope => self.scope,
            State::SelectingMethod => self.method,
            _ => false,
        }
    }
}

const SELECTIONS: [State; 3] = [
    State::SelectingSkills,
    State::SelectingScope,
    State::SelectingMethod,
];

pub fn next_state(state: State, event: Event, steps: Steps) -> State {
    if state.is_terminal() {
        return state;
    }

    match event {
        Event::Cancel => State::Cancelled,
        Event::Fail => State::Failed,
        Event::Proceed => match state {
            State::Identifying => State::Fetching,
            State::Fetching => State::Scanning,
            State::Scanning => State::SelectingSkills,
            State::SelectingSkills => State::SelectingScope,
            State::SelectingScope => State::SelectingMethod,
            State::SelectingMethod => State::Publishing,
            State::Publishing => State::Done,
            terminal => terminal,
        },
        Event::Back if state.is_selection() => {
            let current = SELECTIONS.iter().position(|s| *s == state).unwrap_or(0);
            SELECTIONS[..current]
                .iter()
                .rev()
                .find(|s| steps.is_interactive(**s))
                .copied()
                .unwrap_or(State::Cancelled)
        }
        Event::Back => state,
    }
}
