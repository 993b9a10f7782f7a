pub mod coordinator;
pub mod event;
pub mod game_loop;
pub mod leaderboard;
pub mod save;
pub mod screen;
pub mod state;
pub mod tutorial;
pub mod view;
