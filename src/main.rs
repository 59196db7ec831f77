fn main() {
    course_registry::run();
}
