use warden_bot_commons::*;

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "WARNING,chat_warden_bot=debug");
    }
    start_everything(chat_warden_bot::entry());
}
