#[salsa::interned(debug)]
pub struct Symbol<'db> {
    #[returns(deref)]
    pub text: Box<str>,
}

pub trait IntoSymbol<'db> {
    fn into_symbol(self, db: &'db dyn salsa::Database) -> Symbol<'db>;
}

impl<'db> IntoSymbol<'db> for &str {
    fn into_symbol(self, db: &'db dyn salsa::Database) -> Symbol<'db> {
        Symbol::new(db, self)
    }
}

impl<'db> IntoSymbol<'db> for Symbol<'db> {
    fn into_symbol(self, _db: &'db dyn salsa::Database) -> Symbol<'db> {
        self
    }
}
