fn main() {
    orgchart_lib::run()
}
