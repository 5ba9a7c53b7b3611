use lazy_static::lazy_static;
use sfml::window::Key;
use std::collections::HashMap;

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum Command {
    Load,
    Start,
    Stop,
    Quit,
}

lazy_static! {
    static ref KEYMAP: HashMap<Command, Vec<Key>> = vec![
        (Command::Load, vec![Key::L]),
        (Command::Start, vec![Key::Return, Key::R]),
        (Command::Stop, vec![Key::Space, Key::S]),
        (Command::Quit, vec![Key::Escape]),
    ]
    .into_iter()
    .collect();
}

pub fn command_for(code: Key) -> Option<Command> {
    KEYMAP
        .iter()
        .find(|(_, keys)| keys.contains(&code))
        .map(|(command, _)| *command)
}
