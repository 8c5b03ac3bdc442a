pub mod standings_poller;
