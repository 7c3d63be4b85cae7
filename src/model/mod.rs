pub mod check_event;
