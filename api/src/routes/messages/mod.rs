pub mod messages_response;
pub mod messages_route;
