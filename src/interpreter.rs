use std::{collections::BTreeMap, fmt::Display, io::Write, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{
    expr::{AssignExpr, BinaryExpr, Expr, Literal, UnaryExpr, VariableExpr},
    stmt::{Stmt, VarDeclaration},
    token::Token,
    value::Value,
};

/// Lexical scopes, innermost last. Index 0 is the global scope and lives for
/// the whole program run; block scopes are pushed and popped around block
/// execution, so the parent chain is implicit in stack order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    scopes: Vec<BTreeMap<Rc<str>, Value>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            scopes: vec![BTreeMap::new()],
        }
    }
}

impl Environment {
    fn get(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .map(|value| value.to_owned())
    }

    pub(crate) fn resolve(&self, name: &str, line: usize) -> Result<Value, RuntimeError> {
        self.get(name).ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::UndefinedVariable(name.to_owned()), line)
        })
    }

    /// Binds or rebinds in the innermost scope; shadowing and redefinition
    /// are always permitted.
    pub(crate) fn define(&mut self, name: Rc<str>, value: Value) {
        self.scopes
            .last_mut()
            .expect("global scope is always present")
            .insert(name, value);
    }

    /// Mutates the nearest enclosing scope that already binds `name`.
    /// Assignment never creates a binding.
    pub(crate) fn assign(
        &mut self,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<(), RuntimeError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(RuntimeError::new(
            RuntimeErrorKind::UndefinedVariable(name.to_owned()),
            line,
        ))
    }

    fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "popped the global scope");
        self.scopes.pop();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_new::new)]
pub struct RuntimeError {
    kind: RuntimeErrorKind,
    line: usize,
}

impl RuntimeError {
    pub fn kind(&self) -> &RuntimeErrorKind {
        &self.kind
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("Operand must be a number.")]
    ExpectedNumberOperand,

    #[error("Operands must be numbers.")]
    ExpectedNumberOperands,

    #[error("Operands must be two numbers or two strings.")]
    ExpectedNumbersOrStrings,

    #[error("Division by zero.")]
    DivisionByZero,

    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for RuntimeError {}

pub trait Evaluate {
    fn eval(&self, env: &mut Environment) -> Result<Value, RuntimeError>;
}

pub trait StaticEvaluate: Evaluate {
    fn static_eval(&self) -> Value;
}

impl<T> Evaluate for T
where
    T: StaticEvaluate,
{
    fn eval(&self, _env: &mut Environment) -> Result<Value, RuntimeError> {
        Ok(self.static_eval())
    }
}

impl StaticEvaluate for Literal {
    fn static_eval(&self) -> Value {
        self.into()
    }
}

impl Evaluate for Expr {
    fn eval(&self, env: &mut Environment) -> Result<Value, RuntimeError> {
        match self {
            Expr::Assign(inner) => inner.eval(env),
            Expr::Binary(inner) => inner.eval(env),
            Expr::Grouping(inner) => inner.eval(env),
            Expr::Literal(inner) => inner.eval(env),
            Expr::Unary(inner) => inner.eval(env),
            Expr::Variable(inner) => inner.eval(env),
        }
    }
}

impl Evaluate for VariableExpr {
    fn eval(&self, env: &mut Environment) -> Result<Value, RuntimeError> {
        env.resolve(&self.name, self.line)
    }
}

impl Evaluate for AssignExpr {
    fn eval(&self, env: &mut Environment) -> Result<Value, RuntimeError> {
        // Assignment is itself an expression: it yields the assigned value.
        let value = self.value.eval(env)?;
        env.assign(&self.name, value.clone(), self.line)?;
        Ok(value)
    }
}

impl Evaluate for UnaryExpr {
    fn eval(&self, env: &mut Environment) -> Result<Value, RuntimeError> {
        let inner = self.right.eval(env)?;

        match self.operator {
            Token::Minus => match inner.as_number() {
                Some(n) => Ok(Value::Number(-n)),
                None => Err(RuntimeError::new(
                    RuntimeErrorKind::ExpectedNumberOperand,
                    self.line,
                )),
            },
            Token::Bang => Ok((!inner.as_bool()).into()),
            _ => unreachable!("operator {:?} used in UnaryExpr: {:?}", self.operator, self),
        }
    }
}

impl Evaluate for BinaryExpr {
    fn eval(&self, env: &mut Environment) -> Result<Value, RuntimeError> {
        // Execution is left-to-right.
        let left = self.left.eval(env)?;
        let right = self.right.eval(env)?;

        match self.operator {
            Token::Plus => {
                // We might be adding numbers or strings, handle both cases.
                if let (Value::Number(l), Value::Number(r)) = (&left, &right) {
                    Ok(Value::Number(l + r))
                } else if let (Value::String(l), Value::String(r)) = (&left, &right) {
                    let output = l.to_string() + r.as_ref();
                    Ok(Value::String(Rc::from(output.as_str())))
                } else {
                    Err(RuntimeError::new(
                        RuntimeErrorKind::ExpectedNumbersOrStrings,
                        self.line,
                    ))
                }
            }
            Token::Minus
            | Token::Star
            | Token::Slash
            | Token::Greater
            | Token::GreaterEqual
            | Token::Less
            | Token::LessEqual => {
                // We are doing math or algebraic comparisons on numbers.
                if let (Value::Number(l), Value::Number(r)) = (&left, &right) {
                    match self.operator {
                        Token::Minus => Ok(Value::Number(l - r)),
                        Token::Star => Ok(Value::Number(l * r)),
                        Token::Slash => {
                            if *r == 0.0 {
                                Err(RuntimeError::new(
                                    RuntimeErrorKind::DivisionByZero,
                                    self.line,
                                ))
                            } else {
                                Ok(Value::Number(l / r))
                            }
                        }
                        Token::Greater => Ok(Value::Boolean(l > r)),
                        Token::Less => Ok(Value::Boolean(l < r)),
                        Token::GreaterEqual => {
                            // Account for our special IEEE 754 non-compliant number equality.
                            Ok(Value::Boolean((l >= r) || (l.is_nan() && r.is_nan())))
                        }
                        Token::LessEqual => {
                            // Account for our special IEEE 754 non-compliant number equality.
                            Ok(Value::Boolean((l <= r) || (l.is_nan() && r.is_nan())))
                        }
                        _ => unreachable!(),
                    }
                } else {
                    Err(RuntimeError::new(
                        RuntimeErrorKind::ExpectedNumberOperands,
                        self.line,
                    ))
                }
            }
            Token::EqualEqual | Token::BangEqual => {
                // We are checking values for equality, all value types are allowed here.
                match self.operator {
                    Token::EqualEqual => Ok(Value::Boolean(left == right)),
                    Token::BangEqual => Ok(Value::Boolean(left != right)),
                    _ => unreachable!(),
                }
            }
            _ => unreachable!(
                "operator {:?} used in BinaryExpr: {:?}",
                self.operator, self
            ),
        }
    }
}

pub struct Interpreter<'a, W: Write> {
    out: &'a mut W,
    env: Environment,
}

impl<'a, W: Write> Interpreter<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self {
            out,
            env: Environment::default(),
        }
    }

    /// Execute statements in order, stopping at the first runtime failure.
    /// Output printed and bindings written before the failure stay in effect.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    fn execute(&mut self, statement: &Stmt) -> Result<(), RuntimeError> {
        match statement {
            Stmt::Expression(expr) => {
                expr.eval(&mut self.env)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = expr.eval(&mut self.env)?;
                let _ = writeln!(self.out, "{value}");
                Ok(())
            }
            Stmt::VarDeclaration(declaration) => self.execute_var_declaration(declaration),
            Stmt::Block(statements) => self.execute_block(statements),
        }
    }

    fn execute_var_declaration(
        &mut self,
        declaration: &VarDeclaration,
    ) -> Result<(), RuntimeError> {
        let value = match &declaration.initializer {
            Some(initializer) => initializer.eval(&mut self.env)?,
            None => Value::Nil,
        };
        self.env.define(declaration.name.clone(), value);
        Ok(())
    }

    /// The enclosing scope comes back on every exit path, and a failure
    /// inside the block still reaches the caller.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        self.env.push_scope();
        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));
        self.env.pop_scope();
        result
    }
}
