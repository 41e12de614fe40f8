//! Renders an expression tree back to text: a parenthesized prefix form and
//! a reverse Polish form. Useful for debugging what the parser built.

use crate::expr::{Expr, Literal};

/// Parenthesized prefix rendering, e.g. `(* (- 123) (group 45.67))`.
pub fn pretty(expr: &Expr) -> String {
    match expr {
        Expr::Literal(literal) => literal_text(literal),
        Expr::Grouping(inner) => format!("(group {})", pretty(inner)),
        Expr::Unary(unary) => format!("({} {})", unary.operator, pretty(&unary.right)),
        Expr::Binary(binary) => format!(
            "({} {} {})",
            binary.operator,
            pretty(&binary.left),
            pretty(&binary.right)
        ),
        Expr::Variable(variable) => variable.name.to_string(),
        Expr::Assign(assign) => format!("(= {} {})", assign.name, pretty(&assign.value)),
    }
}

/// Reverse Polish rendering, e.g. `1 2 + 4 3 - *`. Groupings add nothing:
/// the operand order already encodes them.
pub fn rpn(expr: &Expr) -> String {
    match expr {
        Expr::Literal(literal) => literal_text(literal),
        Expr::Grouping(inner) => rpn(inner),
        Expr::Unary(unary) => format!("{} {}", rpn(&unary.right), unary.operator),
        Expr::Binary(binary) => format!(
            "{} {} {}",
            rpn(&binary.left),
            rpn(&binary.right),
            binary.operator
        ),
        Expr::Variable(variable) => variable.name.to_string(),
        Expr::Assign(assign) => format!("{} {} =", rpn(&assign.value), assign.name),
    }
}

fn literal_text(literal: &Literal) -> String {
    match literal {
        Literal::Nil => "nil".to_string(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Number(n) => n.to_string(),
        Literal::String(s) => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Parser, scanner::scan, stmt::Stmt};

    fn parse_expr(source: &str) -> Expr {
        let (lexemes, errors) = scan(source);
        assert!(errors.is_empty());
        let (statements, errors) = Parser::new(lexemes.into_iter()).parse();
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        match statements.into_iter().next() {
            Some(Stmt::Expression(expr)) => expr,
            other => panic!("expected a single expression statement, got {other:?}"),
        }
    }

    #[test]
    fn pretty_prints_nested_expression() {
        let expr = parse_expr("-123 * (45.67);");
        assert_eq!(pretty(&expr), "(* (- 123) (group 45.67))");
    }

    #[test]
    fn pretty_prints_assignment() {
        let expr = parse_expr("a = b + nil;");
        assert_eq!(pretty(&expr), "(= a (+ b nil))");
    }

    #[test]
    fn rpn_prints_operands_before_operators() {
        let expr = parse_expr("(1 + 2) * (4 - 3);");
        assert_eq!(rpn(&expr), "1 2 + 4 3 - *");
    }

    #[test]
    fn rpn_unary_follows_its_operand() {
        let expr = parse_expr("-1 + !true;");
        assert_eq!(rpn(&expr), "1 - true ! +");
    }
}
