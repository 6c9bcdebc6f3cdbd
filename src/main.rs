fn main() {
    ipmerge::cli::run();
}
