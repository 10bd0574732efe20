//! A scripted in-memory connection.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use recordset::prelude::*;

/// What the next statement answers.
#[derive(Debug, Clone)]
pub enum Reply {
    Rows(Vec<Row>),
    Affected(u64),
    Fail(String),
}

/// A statement the connection received.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Default)]
struct State {
    replies: VecDeque<Reply>,
    log: Vec<Executed>,
}

/// Connection answering statements from a queue of replies.
///
/// Clones share the queue and the log, so a test keeps one handle after
/// moving another into the Environment. Unscripted SELECTs return no rows
/// and unscripted writes affect one row.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnection {
    state: Rc<RefCell<State>>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, reply: Reply) -> &Self {
        self.state.borrow_mut().replies.push_back(reply);
        self
    }

    pub fn reply_rows(&self, rows: Vec<Row>) -> &Self {
        self.reply(Reply::Rows(rows))
    }

    /// Rows carrying only an `id` column.
    pub fn reply_ids(&self, ids: &[i64]) -> &Self {
        self.reply_rows(ids.iter().map(|id| Row::from_pairs([("id", *id)])).collect())
    }

    pub fn reply_affected(&self, n: u64) -> &Self {
        self.reply(Reply::Affected(n))
    }

    pub fn reply_error(&self, message: &str) -> &Self {
        self.reply(Reply::Fail(message.to_string()))
    }

    pub fn log(&self) -> Vec<Executed> {
        self.state.borrow().log.clone()
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.state.borrow().log.iter().map(|e| e.sql.clone()).collect()
    }

    pub fn statement_count(&self) -> usize {
        self.state.borrow().log.len()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    fn next(&self, sql: &str, params: &[Value]) -> Option<Reply> {
        let mut state = self.state.borrow_mut();
        state.log.push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        state.replies.pop_front()
    }
}

impl Connection for ScriptedConnection {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        match self.next(sql, params) {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(Error::store_with_sql(message, sql)),
            Some(Reply::Affected(_)) => panic!("scripted an affected count for a query: {sql}"),
            None => Ok(Vec::new()),
        }
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        match self.next(sql, params) {
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Fail(message)) => Err(Error::store_with_sql(message, sql)),
            Some(Reply::Rows(_)) => panic!("scripted rows for a write: {sql}"),
            None => Ok(1),
        }
    }
}
