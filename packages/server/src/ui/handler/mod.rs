mod http;
mod websocket;

pub use http::{
    create_room, get_room_detail, get_rooms, health_check, join_room, launch_game, leave_room,
    submit_progress,
};
pub use websocket::websocket_handler;
