//! Query expression trees.
//!
//! A [`QueryNode`] describes a predicate, projection, assignment or ordering
//! over one or more entity types. Trees are built once with the fluent API
//! below and are read-only during compilation.
//!
//! ```
//! use sqlweave_query::QueryNode;
//! # use sqlweave_core::{ColumnInfo, Entity, Value};
//! # struct User;
//! # impl Entity for User {
//! #     const TYPE_NAME: &'static str = "User";
//! #     fn columns() -> &'static [ColumnInfo] {
//! #         static C: &[ColumnInfo] = &[ColumnInfo::new("Age")];
//! #         C
//! #     }
//! #     fn to_row(&self) -> Vec<(&'static str, Value)> { Vec::new() }
//! # }
//!
//! let user = QueryNode::parameter::<User>();
//! let adult = user.clone().member("Age").ge(18).and(user.member("Age").lt(65));
//! ```

use std::sync::Arc;

use sqlweave_core::{Entity, EntityMetadata, Value, resolve};

use crate::methods::Method;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    /// Get the SQL representation of this operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::AndAlso => "AND",
            BinaryOperator::OrElse => "OR",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        }
    }

    /// Get the precedence of this operator (higher = binds tighter).
    pub const fn precedence(self) -> u8 {
        match self {
            BinaryOperator::OrElse => 1,
            BinaryOperator::AndAlso => 2,
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => 3,
            BinaryOperator::Add | BinaryOperator::Subtract => 7,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 8,
        }
    }

    pub const fn is_comparison(self) -> bool {
        self.precedence() == 3
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::AndAlso | BinaryOperator::OrElse)
    }

    pub const fn is_arithmetic(self) -> bool {
        self.precedence() >= 7
    }

    /// Operators where `a op (b op c)` differs from `(a op b) op c`.
    pub const fn is_left_associative_only(self) -> bool {
        matches!(
            self,
            BinaryOperator::Subtract | BinaryOperator::Divide | BinaryOperator::Modulo
        )
    }

    /// The operator producing the logical complement.
    ///
    /// Comparisons invert (`>` becomes `<=`), connectives swap per De Morgan.
    /// Arithmetic has no complement and is returned unchanged.
    pub const fn negate(self) -> Self {
        match self {
            BinaryOperator::Equal => BinaryOperator::NotEqual,
            BinaryOperator::NotEqual => BinaryOperator::Equal,
            BinaryOperator::LessThan => BinaryOperator::GreaterThanOrEqual,
            BinaryOperator::LessThanOrEqual => BinaryOperator::GreaterThan,
            BinaryOperator::GreaterThan => BinaryOperator::LessThanOrEqual,
            BinaryOperator::GreaterThanOrEqual => BinaryOperator::LessThan,
            BinaryOperator::AndAlso => BinaryOperator::OrElse,
            BinaryOperator::OrElse => BinaryOperator::AndAlso,
            other => other,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Logical NOT
    Not,
    /// Arithmetic negation
    Negate,
    /// Transparent type conversion; translated as its operand
    Convert,
}

/// Names each node variant for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Binary,
    Unary,
    Member,
    MethodCall,
    Constant,
    Construct,
    Array,
    List,
    Parameter,
    Invocation,
}

impl NodeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Binary => "Binary",
            NodeKind::Unary => "Unary",
            NodeKind::Member => "Member",
            NodeKind::MethodCall => "MethodCall",
            NodeKind::Constant => "Constant",
            NodeKind::Construct => "Construct",
            NodeKind::Array => "Array",
            NodeKind::List => "List",
            NodeKind::Parameter => "Parameter",
            NodeKind::Invocation => "Invocation",
        }
    }
}

/// A node of a query expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Binary {
        left: Box<QueryNode>,
        op: BinaryOperator,
        right: Box<QueryNode>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<QueryNode>,
    },
    /// Property access on an owner, usually a [`QueryNode::Parameter`].
    Member {
        owner: Box<QueryNode>,
        member: String,
    },
    /// Call of a recognized method. Static forms carry no target and pass
    /// the receiver as the first argument.
    MethodCall {
        target: Option<Box<QueryNode>>,
        method: Method,
        args: Vec<QueryNode>,
    },
    Constant(Value),
    /// Object construction with member bindings. `entity` is `None` for
    /// anonymous shapes.
    Construct {
        entity: Option<Arc<EntityMetadata>>,
        members: Vec<(String, QueryNode)>,
    },
    Array(Vec<QueryNode>),
    List(Vec<QueryNode>),
    /// Reference to a row of an entity's table. A name becomes the alias.
    Parameter {
        entity: Arc<EntityMetadata>,
        name: Option<String>,
    },
    /// Call of a nested expression; translated as the expression itself.
    Invocation(Box<QueryNode>),
}

impl QueryNode {
    // ==================== Leaves ====================

    /// Reference rows of `E`.
    pub fn parameter<E: Entity>() -> Self {
        QueryNode::Parameter {
            entity: resolve::<E>(),
            name: None,
        }
    }

    /// Reference rows of `E` under an explicit alias.
    pub fn named_parameter<E: Entity>(name: impl Into<String>) -> Self {
        QueryNode::Parameter {
            entity: resolve::<E>(),
            name: Some(name.into()),
        }
    }

    /// Shorthand for `parameter::<E>().member(member)`.
    pub fn column<E: Entity>(member: impl Into<String>) -> Self {
        Self::parameter::<E>().member(member)
    }

    /// A constant value.
    pub fn constant(value: impl Into<Value>) -> Self {
        QueryNode::Constant(value.into())
    }

    /// The NULL constant.
    pub fn null() -> Self {
        QueryNode::Constant(Value::Null)
    }

    /// An entity instance as a construct of constants in metadata order.
    pub fn entity<E: Entity>(value: &E) -> Self {
        let members = value
            .to_row()
            .into_iter()
            .map(|(property, value)| (property.to_string(), QueryNode::Constant(value)))
            .collect();
        QueryNode::Construct {
            entity: Some(resolve::<E>()),
            members,
        }
    }

    /// An array of entity instances.
    pub fn entities<E: Entity>(values: &[E]) -> Self {
        QueryNode::Array(values.iter().map(Self::entity).collect())
    }

    /// A construct of `E` with the given member bindings.
    pub fn construct_for<E: Entity>(
        members: impl IntoIterator<Item = (impl Into<String>, QueryNode)>,
    ) -> Self {
        QueryNode::Construct {
            entity: Some(resolve::<E>()),
            members: members.into_iter().map(|(m, v)| (m.into(), v)).collect(),
        }
    }

    /// An anonymous construct (projection shape).
    pub fn construct(members: impl IntoIterator<Item = (impl Into<String>, QueryNode)>) -> Self {
        QueryNode::Construct {
            entity: None,
            members: members.into_iter().map(|(m, v)| (m.into(), v)).collect(),
        }
    }

    /// An array literal.
    pub fn array(items: impl IntoIterator<Item = impl Into<QueryNode>>) -> Self {
        QueryNode::Array(items.into_iter().map(Into::into).collect())
    }

    /// A list literal.
    pub fn list(items: impl IntoIterator<Item = impl Into<QueryNode>>) -> Self {
        QueryNode::List(items.into_iter().map(Into::into).collect())
    }

    /// A static method call (receiver passed as the first argument).
    pub fn call_static(method: Method, args: Vec<QueryNode>) -> Self {
        QueryNode::MethodCall {
            target: None,
            method,
            args,
        }
    }

    // ==================== Composition ====================

    /// Access a member of this node.
    pub fn member(self, member: impl Into<String>) -> Self {
        QueryNode::Member {
            owner: Box::new(self),
            member: member.into(),
        }
    }

    /// Call a method on this node.
    pub fn call(self, method: Method, args: Vec<QueryNode>) -> Self {
        QueryNode::MethodCall {
            target: Some(Box::new(self)),
            method,
            args,
        }
    }

    /// Wrap in an invocation.
    pub fn invoke(self) -> Self {
        QueryNode::Invocation(Box::new(self))
    }

    fn binary(self, op: BinaryOperator, other: impl Into<QueryNode>) -> Self {
        QueryNode::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other.into()),
        }
    }

    fn unary(self, op: UnaryOperator) -> Self {
        QueryNode::Unary {
            op,
            operand: Box::new(self),
        }
    }

    pub fn eq(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::Equal, other)
    }

    pub fn ne(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::NotEqual, other)
    }

    pub fn lt(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::LessThan, other)
    }

    pub fn le(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::LessThanOrEqual, other)
    }

    pub fn gt(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::GreaterThan, other)
    }

    pub fn ge(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::GreaterThanOrEqual, other)
    }

    pub fn and(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::AndAlso, other)
    }

    pub fn or(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::OrElse, other)
    }

    pub fn add(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::Add, other)
    }

    pub fn sub(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::Subtract, other)
    }

    pub fn mul(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::Multiply, other)
    }

    pub fn div(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::Divide, other)
    }

    pub fn modulo(self, other: impl Into<QueryNode>) -> Self {
        self.binary(BinaryOperator::Modulo, other)
    }

    pub fn not(self) -> Self {
        self.unary(UnaryOperator::Not)
    }

    pub fn negate(self) -> Self {
        self.unary(UnaryOperator::Negate)
    }

    pub fn convert(self) -> Self {
        self.unary(UnaryOperator::Convert)
    }

    // ==================== Method shorthands ====================

    pub fn like(self, pattern: impl Into<QueryNode>) -> Self {
        self.call(Method::Like, vec![pattern.into()])
    }

    pub fn like_left(self, pattern: impl Into<QueryNode>) -> Self {
        self.call(Method::LikeLeft, vec![pattern.into()])
    }

    pub fn like_right(self, pattern: impl Into<QueryNode>) -> Self {
        self.call(Method::LikeRight, vec![pattern.into()])
    }

    pub fn not_like(self, pattern: impl Into<QueryNode>) -> Self {
        self.call(Method::NotLike, vec![pattern.into()])
    }

    /// `self IN (values)`.
    pub fn is_in(self, values: impl Into<QueryNode>) -> Self {
        self.call(Method::In, vec![values.into()])
    }

    /// `self NOT IN (values)`.
    pub fn not_in(self, values: impl Into<QueryNode>) -> Self {
        self.call(Method::NotIn, vec![values.into()])
    }

    /// Substring match on a string receiver, membership on a collection.
    pub fn contains(self, item: impl Into<QueryNode>) -> Self {
        self.call(Method::Contains, vec![item.into()])
    }

    pub fn is_null_or_empty(self) -> Self {
        QueryNode::call_static(Method::IsNullOrEmpty, vec![self])
    }

    pub fn equals(self, other: impl Into<QueryNode>) -> Self {
        self.call(Method::Equals, vec![other.into()])
    }

    pub fn to_upper(self) -> Self {
        self.call(Method::ToUpper, Vec::new())
    }

    pub fn to_lower(self) -> Self {
        self.call(Method::ToLower, Vec::new())
    }

    pub fn trim(self) -> Self {
        self.call(Method::Trim, Vec::new())
    }

    pub fn trim_start(self) -> Self {
        self.call(Method::TrimStart, Vec::new())
    }

    pub fn trim_end(self) -> Self {
        self.call(Method::TrimEnd, Vec::new())
    }

    pub fn to_array(self) -> Self {
        self.call(Method::ToArray, Vec::new())
    }

    pub fn to_list(self) -> Self {
        self.call(Method::ToList, Vec::new())
    }

    // ==================== Inspection ====================

    pub fn kind(&self) -> NodeKind {
        match self {
            QueryNode::Binary { .. } => NodeKind::Binary,
            QueryNode::Unary { .. } => NodeKind::Unary,
            QueryNode::Member { .. } => NodeKind::Member,
            QueryNode::MethodCall { .. } => NodeKind::MethodCall,
            QueryNode::Constant(_) => NodeKind::Constant,
            QueryNode::Construct { .. } => NodeKind::Construct,
            QueryNode::Array(_) => NodeKind::Array,
            QueryNode::List(_) => NodeKind::List,
            QueryNode::Parameter { .. } => NodeKind::Parameter,
            QueryNode::Invocation(_) => NodeKind::Invocation,
        }
    }

    /// Strip `Convert` and `Invocation` wrappers.
    pub fn unwrapped(&self) -> &QueryNode {
        match self {
            QueryNode::Unary {
                op: UnaryOperator::Convert,
                operand,
            } => operand.unwrapped(),
            QueryNode::Invocation(inner) => inner.unwrapped(),
            other => other,
        }
    }

    /// The boolean literal this node carries, if it is one.
    pub fn as_bool_constant(&self) -> Option<bool> {
        match self.unwrapped() {
            QueryNode::Constant(value) => value.as_bool(),
            _ => None,
        }
    }

    /// Whether this node is the NULL constant.
    pub fn is_null_constant(&self) -> bool {
        matches!(self.unwrapped(), QueryNode::Constant(Value::Null))
    }

    /// Whether this node is a column reference.
    pub fn is_member(&self) -> bool {
        matches!(self.unwrapped(), QueryNode::Member { .. })
    }

    /// Whether this node yields a condition rather than a value.
    ///
    /// Comparisons, connectives, boolean method calls and NOT count; a bare
    /// boolean column does not.
    pub fn is_predicate(&self) -> bool {
        match self.unwrapped() {
            QueryNode::Binary { op, .. } => op.is_comparison() || op.is_logical(),
            QueryNode::MethodCall { method, .. } => method.is_predicate(),
            QueryNode::Unary {
                op: UnaryOperator::Not,
                ..
            } => true,
            _ => false,
        }
    }

    /// Number of items this node contributes to an `IN (...)` list, when it
    /// is statically known.
    pub fn collection_len(&self) -> Option<usize> {
        match self.unwrapped() {
            QueryNode::Array(items) | QueryNode::List(items) => Some(items.len()),
            QueryNode::Constant(Value::Array(items)) => Some(items.len()),
            QueryNode::MethodCall {
                target: Some(target),
                method,
                ..
            } if method.is_materializer() => target.collection_len(),
            _ => None,
        }
    }

    /// Visit this node and all descendants depth-first, parents first.
    pub fn walk<'n>(&'n self, visit: &mut impl FnMut(&'n QueryNode)) {
        visit(self);
        match self {
            QueryNode::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            QueryNode::Unary { operand, .. } => operand.walk(visit),
            QueryNode::Member { owner, .. } => owner.walk(visit),
            QueryNode::MethodCall { target, args, .. } => {
                if let Some(target) = target {
                    target.walk(visit);
                }
                for arg in args {
                    arg.walk(visit);
                }
            }
            QueryNode::Construct { members, .. } => {
                for (_, value) in members {
                    value.walk(visit);
                }
            }
            QueryNode::Array(items) | QueryNode::List(items) => {
                for item in items {
                    item.walk(visit);
                }
            }
            QueryNode::Invocation(inner) => inner.walk(visit),
            QueryNode::Constant(_) | QueryNode::Parameter { .. } => {}
        }
    }

    /// The first alias given to a parameter over `table`, if any.
    pub fn parameter_name_for(&self, table: &str) -> Option<&str> {
        let mut found = None;
        self.walk(&mut |node| {
            if found.is_some() {
                return;
            }
            if let QueryNode::Parameter {
                entity,
                name: Some(name),
            } = node
            {
                if entity.table_name == table {
                    found = Some(name.as_str());
                }
            }
        });
        found
    }
}

impl From<Value> for QueryNode {
    fn from(v: Value) -> Self {
        QueryNode::Constant(v)
    }
}

impl From<&str> for QueryNode {
    fn from(s: &str) -> Self {
        QueryNode::Constant(Value::Text(s.to_string()))
    }
}

impl From<String> for QueryNode {
    fn from(s: String) -> Self {
        QueryNode::Constant(Value::Text(s))
    }
}

impl From<i32> for QueryNode {
    fn from(n: i32) -> Self {
        QueryNode::Constant(Value::Int(n))
    }
}

impl From<i64> for QueryNode {
    fn from(n: i64) -> Self {
        QueryNode::Constant(Value::BigInt(n))
    }
}

impl From<bool> for QueryNode {
    fn from(b: bool) -> Self {
        QueryNode::Constant(Value::Bool(b))
    }
}

impl From<f64> for QueryNode {
    fn from(n: f64) -> Self {
        QueryNode::Constant(Value::Double(n))
    }
}

impl<T: Into<Value>> From<Option<T>> for QueryNode {
    fn from(v: Option<T>) -> Self {
        QueryNode::Constant(v.into())
    }
}
