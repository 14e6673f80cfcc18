//! Expression AST nodes
//!
//! A parsed report expression is a small tagged tree. Operator runs are kept
//! flat as a [`ChainExpr`] and reduced left to right in scan order, so
//! `=3+4*2` is `(3 + 4) * 2` and a long run never deepens the tree.

use smallvec::SmallVec;

use crate::{BinaryOp, BoxExpr, BuiltinFunction, GlobalVariable, Literal, UnaryOp};

/// All expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    /// `Globals!ExecutionTime`, `User!Language`
    Global(GlobalVariable),
    /// `Fields!Name.Value`
    Field(FieldRef),
    /// `Parameters!Name.Value`
    Parameter(ParameterRef),
    /// Non-aggregate built-in call
    Call(CallExpr),
    /// Aggregate call with optional dataset scope
    Aggregate(AggregateExpr),
    /// `IIf(condition, then, else)`
    Conditional(ConditionalExpr),
    /// Operands joined by binary operators, folded left
    Chain(ChainExpr),
    UnaryOp(UnaryOpExpr),
    /// Trailing text no recognizer matched, kept verbatim
    Text(String),
    /// A malformed fragment (wrong argument count, unbalanced call).
    /// Evaluates to Nothing.
    Unresolved(UnresolvedFragment),
}

/// Property of a field reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldProperty {
    #[default]
    Value,
    IsMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// Field name as written; lookups are case-insensitive
    pub name: String,
    pub property: FieldProperty,
}

impl FieldRef {
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property: FieldProperty::Value,
        }
    }
}

/// Property of a parameter reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterProperty {
    #[default]
    Value,
    Label,
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRef {
    pub name: String,
    pub property: ParameterProperty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub function: BuiltinFunction,
    pub args: SmallVec<[BoxExpr; 4]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    pub function: BuiltinFunction,
    /// Per-row expression; absent for `CountRows()` and `RowNumber()`
    pub argument: Option<BoxExpr>,
    /// Quoted dataset name restricting the rows aggregated over
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    pub condition: BoxExpr,
    pub then_branch: BoxExpr,
    pub else_branch: BoxExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainExpr {
    pub first: BoxExpr,
    /// Operator and right operand of each step, in scan order
    pub rest: Vec<(BinaryOp, BoxExpr)>,
}

impl ChainExpr {
    pub fn new(first: BoxExpr) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }

    pub fn push(&mut self, op: BinaryOp, operand: BoxExpr) {
        self.rest.push((op, operand));
    }

    pub fn operators(&self) -> impl Iterator<Item = BinaryOp> + '_ {
        self.rest.iter().map(|(op, _)| *op)
    }

    pub fn operands(&self) -> impl Iterator<Item = &BoxExpr> + '_ {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, operand)| operand))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOpExpr {
    pub op: UnaryOp,
    pub operand: BoxExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedFragment {
    pub text: String,
    pub reason: String,
}

impl Expression {
    pub fn literal(literal: Literal) -> Self {
        Self::Literal(literal)
    }

    pub fn unresolved(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unresolved(UnresolvedFragment {
            text: text.into(),
            reason: reason.into(),
        })
    }

    /// Direct children, in evaluation order
    pub fn children(&self) -> SmallVec<[&BoxExpr; 4]> {
        match self {
            Self::Call(call) => call.args.iter().collect(),
            Self::Aggregate(agg) => agg.argument.iter().collect(),
            Self::Conditional(c) => {
                SmallVec::from_iter([&c.condition, &c.then_branch, &c.else_branch])
            }
            Self::Chain(chain) => chain.operands().collect(),
            Self::UnaryOp(u) => SmallVec::from_iter([&u.operand]),
            Self::Literal(_)
            | Self::Global(_)
            | Self::Field(_)
            | Self::Parameter(_)
            | Self::Text(_)
            | Self::Unresolved(_) => SmallVec::new(),
        }
    }

    /// Whether a field is referenced outside of any aggregate.
    ///
    /// A table row containing such a reference repeats once per data row;
    /// a row whose fields all sit inside aggregates is a summary row.
    pub fn references_bare_field(&self) -> bool {
        match self {
            Self::Field(_) => true,
            Self::Aggregate(_) => false,
            other => other
                .children()
                .into_iter()
                .any(|child| child.references_bare_field()),
        }
    }

    /// Whether any aggregate appears in the tree
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Self::Aggregate(_) => true,
            other => other
                .children()
                .into_iter()
                .any(|child| child.contains_aggregate()),
        }
    }

    /// Malformed fragments anywhere in the tree, in evaluation order
    pub fn unresolved_fragments(&self) -> Vec<&UnresolvedFragment> {
        match self {
            Self::Unresolved(fragment) => vec![fragment],
            other => other
                .children()
                .into_iter()
                .flat_map(|child| child.unresolved_fragments())
                .collect(),
        }
    }
}
