//! Parser for task files
//!
//! Grammar, ignoring comments and inline whitespace:
//!
//! ```text
//! file        := task*
//! task        := taskName (':' | '(' param (',' param)* ')' ':') NEWLINE subtaskLine*
//! param       := VarId ('=' arg)?
//! subtaskLine := INDENT ( VarId '=' expr | callList | command ) NEWLINE
//! callList    := call (',' call)*
//! call        := TaskId ('(' (arg (',' arg)*)? ')')?
//! command     := '$' ( '(' VarId ')' )? shellText
//! expr        := command | call | STRING
//! arg         := VarId | STRING
//! taskName    := TaskId | VarId
//! ```
//!
//! Nothing but a task header may start a line without indentation, so an
//! all-capitals header such as `CI:` is read as a task name even though it
//! lexes as a variable.
//!
//! A task with no subtask lines parses; the checker rejects it.

use crate::error::{Result, SyntaxError, SyntaxResult};
use crate::lang::ast::{
    Assignment, Call, Command, DefinedTask, Expr, Location, Param, StringLiteral, Subtask,
    VariableRef,
};
use crate::lang::lexer::{is_task_ident, is_var_ident, tokenize, Spanned, Token};
use crate::lang::program::Program;

/// Parse source text into a program.
///
/// Fails with a syntax error for malformed input, or a semantic error if two
/// tasks share a name modulo case.
pub fn parse_program(source: &str) -> Result<Program> {
    let tasks = parse_tasks(source)?;
    Ok(Program::from_tasks(tasks)?)
}

/// Parse source text into task definitions, in source order
pub fn parse_tasks(source: &str) -> SyntaxResult<Vec<DefinedTask>> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_file()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn location(&self) -> Location {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.location)
            .unwrap_or_default()
    }

    fn advance(&mut self) -> Spanned {
        let location = self.location();
        let spanned = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Spanned::new(Token::Eof, location));
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        spanned
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        SyntaxError::UnexpectedToken {
            location: self.location(),
            expected: expected.to_string(),
            found: self.peek().to_string(),
        }
    }

    fn expect(&mut self, expected: Token) -> SyntaxResult<Location> {
        if *self.peek() == expected {
            Ok(self.advance().location)
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn parse_file(mut self) -> SyntaxResult<Vec<DefinedTask>> {
        let mut tasks = Vec::new();
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::TaskId(_) => tasks.push(self.parse_task()?),
                Token::VarId(name) if is_task_ident(name) => tasks.push(self.parse_task()?),
                _ => return Err(self.unexpected("task name")),
            }
        }
        Ok(tasks)
    }

    fn parse_task(&mut self) -> SyntaxResult<DefinedTask> {
        let Spanned { token, location } = self.advance();
        let name = match token {
            Token::TaskId(name) => name,
            Token::VarId(name) if is_task_ident(&name) => name,
            _ => unreachable!("parse_task is only called on a task name"),
        };

        let mut params = Vec::new();
        if *self.peek() == Token::LParen {
            self.advance();
            params.push(self.parse_param()?);
            while *self.peek() == Token::Comma {
                self.advance();
                params.push(self.parse_param()?);
            }
            self.expect(Token::RParen)?;
        }
        self.expect(Token::Colon)?;
        self.expect(Token::Newline)?;

        let mut subtasks = Vec::new();
        while *self.peek() == Token::Indent {
            self.advance();
            self.parse_subtask_line(&mut subtasks)?;
            self.expect(Token::Newline)?;
        }

        Ok(DefinedTask {
            name,
            params,
            subtasks,
            location,
        })
    }

    fn parse_param(&mut self) -> SyntaxResult<Param> {
        let location = self.location();
        let name = match self.peek() {
            Token::VarId(name) => name.clone(),
            _ => return Err(self.unexpected("parameter name")),
        };
        self.advance();

        let default = if *self.peek() == Token::Equals {
            self.advance();
            Some(self.parse_arg()?)
        } else {
            None
        };

        Ok(Param {
            name,
            default,
            location,
        })
    }

    fn parse_subtask_line(&mut self, subtasks: &mut Vec<Subtask>) -> SyntaxResult<()> {
        match self.peek() {
            Token::VarId(_) => {
                let assignment = self.parse_assignment()?;
                subtasks.push(Subtask::Assignment(assignment));
            }
            Token::TaskId(_) => {
                subtasks.push(Subtask::Call(self.parse_call()?));
                while *self.peek() == Token::Comma {
                    self.advance();
                    subtasks.push(Subtask::Call(self.parse_call()?));
                }
            }
            Token::Command(_) => subtasks.push(Subtask::Command(self.parse_command()?)),
            _ => return Err(self.unexpected("assignment, call or command")),
        }
        Ok(())
    }

    fn parse_assignment(&mut self) -> SyntaxResult<Assignment> {
        let Spanned { token, location } = self.advance();
        let Token::VarId(target) = token else {
            unreachable!("parse_assignment is only called on a variable name");
        };
        if *self.peek() != Token::Equals {
            return Err(self.unexpected("'='"));
        }
        self.advance();

        let value = match self.peek() {
            Token::Command(_) => Expr::Command(self.parse_command()?),
            Token::TaskId(_) => Expr::Call(self.parse_call()?),
            Token::Str(_) => self.parse_arg()?,
            _ => return Err(self.unexpected("command, call or string")),
        };

        Ok(Assignment {
            target,
            value,
            location,
        })
    }

    fn parse_call(&mut self) -> SyntaxResult<Call> {
        let location = self.location();
        let target = match self.peek() {
            Token::TaskId(name) => name.clone(),
            _ => return Err(self.unexpected("task name")),
        };
        self.advance();

        let mut args = Vec::new();
        if *self.peek() == Token::LParen {
            self.advance();
            if *self.peek() != Token::RParen {
                args.push(self.parse_arg()?);
                while *self.peek() == Token::Comma {
                    self.advance();
                    args.push(self.parse_arg()?);
                }
            }
            self.expect(Token::RParen)?;
        }

        Ok(Call {
            target,
            args,
            location,
        })
    }

    fn parse_arg(&mut self) -> SyntaxResult<Expr> {
        let location = self.location();
        let expr = match self.peek() {
            Token::VarId(name) => Expr::Variable(VariableRef {
                name: name.clone(),
                location,
            }),
            Token::Str(text) => Expr::String(StringLiteral {
                text: text.clone(),
                location,
            }),
            _ => return Err(self.unexpected("variable or string")),
        };
        self.advance();
        Ok(expr)
    }

    fn parse_command(&mut self) -> SyntaxResult<Command> {
        let Spanned { token, location } = self.advance();
        let Token::Command(text) = token else {
            unreachable!("parse_command is only called on a command");
        };
        split_stdin(&text, location)
    }
}

/// Separate a leading `(NAME)` stdin redirection from the shell text.
///
/// Only an exact parenthesized variable name counts, so `(cd x && make)`
/// stays a subshell.
fn split_stdin(text: &str, location: Location) -> SyntaxResult<Command> {
    if let Some(rest) = text.strip_prefix('(') {
        if let Some(close) = rest.find(')') {
            let name = &rest[..close];
            if is_var_ident(name) {
                let shell = rest[close + 1..].trim();
                if shell.is_empty() {
                    return Err(SyntaxError::EmptyCommand { location });
                }
                return Ok(Command {
                    text: shell.to_string(),
                    stdin: Some(name.to_string()),
                    location,
                });
            }
        }
    }
    Ok(Command {
        text: text.to_string(),
        stdin: None,
        location,
    })
}
