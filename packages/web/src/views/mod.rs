mod home;
pub use home::Home;

mod login;
pub use login::Login;

mod projects;
pub use projects::Projects;

mod shell;
pub use shell::Shell;

mod users;
pub use users::Users;

pub(crate) const APP_CSS: &str = r#"
body {
    margin: 0;
    background: #121212;
    color: #ffffff;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
}
.navbar {
    position: fixed; top: 0; left: 0; bottom: 0; width: 12rem;
    display: flex; flex-direction: column; justify-content: space-between;
    padding: 1.5rem 1rem; border-right: 1px solid rgba(255, 255, 255, 0.05);
}
.navbar-links { display: flex; flex-direction: column; gap: 0.75rem; }
.navbar-links a { color: #a1a1aa; text-decoration: none; font-size: 0.875rem; }
.navbar-links a:hover, .navbar-links a.active { color: #ffffff; }
.navbar-account { display: flex; align-items: center; gap: 0.5rem; font-size: 0.75rem; }
.navbar-avatar {
    width: 2rem; height: 2rem; border-radius: 9999px; background: #27272a;
    display: flex; align-items: center; justify-content: center;
}
.content { margin-left: 14rem; padding: 2rem; max-width: 64rem; }
.page-status { color: #71717a; padding: 2rem 0; }
.card {
    background: #1c1c1c; border: 1px solid rgba(255, 255, 255, 0.05);
    border-radius: 8px; padding: 1.5rem;
}
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(18rem, 1fr)); gap: 1rem; }
.tags { display: flex; flex-wrap: wrap; gap: 0.375rem; }
.tag { font-size: 0.6875rem; background: #27272a; border-radius: 4px; padding: 0.125rem 0.5rem; }
.btn { border: none; border-radius: 6px; padding: 0.5rem 1rem; font-size: 0.8125rem; cursor: pointer; }
.btn.primary { background: #ffffff; color: #000000; }
.btn.secondary { background: #27272a; color: #ffffff; }
.btn.danger { background: rgba(239, 68, 68, 0.1); color: #ef4444; }
.btn:disabled { opacity: 0.5; cursor: not-allowed; }
label { display: block; font-size: 0.6875rem; text-transform: uppercase; color: #71717a; margin: 0.75rem 0 0.375rem; }
input, textarea, select {
    width: 100%; box-sizing: border-box; background: rgba(0, 0, 0, 0.4); color: #ffffff;
    border: 1px solid rgba(255, 255, 255, 0.1); border-radius: 6px; padding: 0.5rem 0.75rem;
}
.form-error { color: #ef4444; font-size: 0.8125rem; margin-top: 0.75rem; }
table { width: 100%; border-collapse: collapse; font-size: 0.875rem; }
th { text-align: left; font-size: 0.625rem; text-transform: uppercase; color: #a1a1aa; padding: 0.5rem 0.75rem; }
td { padding: 0.5rem 0.75rem; border-top: 1px solid rgba(255, 255, 255, 0.05); }
.toast {
    display: flex; align-items: center; justify-content: space-between; gap: 1rem;
    min-width: 16rem; padding: 0.75rem 1rem; border-radius: 6px; font-size: 0.8125rem;
    background: #1c1c1c; border: 1px solid rgba(255, 255, 255, 0.1);
}
.toast.success { border-color: rgba(16, 185, 129, 0.4); }
.toast.error { border-color: rgba(239, 68, 68, 0.4); }
.toast-dismiss { background: none; border: none; color: #a1a1aa; cursor: pointer; }
"#;
