fn main() {
  ordtx::main();
}
