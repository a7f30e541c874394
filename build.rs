fn main() {
    #[cfg(windows)]
    {
        let mut res = winres::WindowsResource::new();
        res.set_icon("assets/site-map-icon.ico");
        res.compile().unwrap();
    }
}
