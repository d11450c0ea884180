use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    SignUp,
    SignIn,
    Wall(Uuid),
    NotFound,
}

impl Route {
    /// Match a location path. Query strings and fragments are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_matches('/');

        match path {
            "" => Route::Landing,
            "signup" => Route::SignUp,
            "signin" => Route::SignIn,
            seg if !seg.contains('/') => match Uuid::try_parse(seg) {
                Ok(id) => Route::Wall(id),
                Err(_) => Route::NotFound,
            },
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".into(),
            Route::SignUp => "/signup".into(),
            Route::SignIn => "/signin".into(),
            Route::Wall(id) => format!("/{id}"),
            Route::NotFound => "/404".into(),
        }
    }
}
