fn main() -> anyhow::Result<()> {
    env_logger::init();
    joseki::cli::run(std::env::args_os())
}
