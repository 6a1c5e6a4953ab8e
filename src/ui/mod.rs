mod controller;
#[cfg(test)]
mod fakes;
mod page;
mod render;
mod shell;
mod tabs;

pub use controller::Controller;
pub use render::render_lists;
pub use shell::Shell;
