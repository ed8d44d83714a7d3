mod monster_parser;

pub use monster_parser::{MonsterParser, Parser};
