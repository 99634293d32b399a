mod cli;
mod discovery;
mod runtime;

fn main() {
    cli::run();
}
