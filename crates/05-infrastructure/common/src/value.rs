//! 参数与返回值

use crate::errors::ConfigError;
use crate::instance::Instance;
use crate::metadata::TypeKey;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 值绑定支持的标量类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 字符串
    String,
    /// 布尔值
    Bool,
    /// 32 位有符号整数
    I32,
    /// 64 位有符号整数
    I64,
    /// 16 位无符号整数
    U16,
    /// 32 位无符号整数
    U32,
    /// 64 位无符号整数
    U64,
    /// 平台宽度无符号整数
    Usize,
    /// 32 位浮点数
    F32,
    /// 64 位浮点数
    F64,
    /// 逗号分隔的字符串列表
    List,
}

impl ScalarType {
    /// 将配置中的原始字符串转换为标量
    pub fn convert(self, key: &str, raw: &str) -> Result<Scalar, ConfigError> {
        let fail = || ConfigError::TypeConversionError {
            key: key.to_string(),
            value: raw.to_string(),
            target: self.to_string(),
        };
        let trimmed = raw.trim();
        let scalar = match self {
            Self::String => Scalar::Str(raw.to_string()),
            Self::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Scalar::Bool(true),
                "false" => Scalar::Bool(false),
                _ => return Err(fail()),
            },
            Self::I32 => Scalar::Int(i64::from(trimmed.parse::<i32>().map_err(|_| fail())?)),
            Self::I64 => Scalar::Int(trimmed.parse::<i64>().map_err(|_| fail())?),
            Self::U16 => Scalar::UInt(u64::from(trimmed.parse::<u16>().map_err(|_| fail())?)),
            Self::U32 => Scalar::UInt(u64::from(trimmed.parse::<u32>().map_err(|_| fail())?)),
            Self::U64 => Scalar::UInt(trimmed.parse::<u64>().map_err(|_| fail())?),
            Self::Usize => {
                let value = trimmed.parse::<usize>().map_err(|_| fail())?;
                Scalar::UInt(u64::try_from(value).map_err(|_| fail())?)
            }
            Self::F32 => Scalar::Float(f64::from(trimmed.parse::<f32>().map_err(|_| fail())?)),
            Self::F64 => Scalar::Float(trimmed.parse::<f64>().map_err(|_| fail())?),
            Self::List => Scalar::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        };
        Ok(scalar)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::List => "Vec<String>",
        };
        f.write_str(name)
    }
}

/// 标量值
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// 字符串
    Str(String),
    /// 布尔值
    Bool(bool),
    /// 有符号整数
    Int(i64),
    /// 无符号整数
    UInt(u64),
    /// 浮点数
    Float(f64),
    /// 字符串列表
    List(Vec<String>),
}

/// 从标量提取具体类型
pub trait FromScalar: Sized {
    /// 类型不匹配或越界时返回 `None`
    fn from_scalar(scalar: &Scalar) -> Option<Self>;
}

impl FromScalar for String {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Str(s) => Some(s.clone()),
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Int(i) => Some(i.to_string()),
            Scalar::UInt(u) => Some(u.to_string()),
            Scalar::Float(f) => Some(f.to_string()),
            Scalar::List(items) => Some(items.join(",")),
        }
    }
}

impl FromScalar for bool {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

macro_rules! impl_from_scalar_int {
    ($($ty:ty),*) => {
        $(
            impl FromScalar for $ty {
                fn from_scalar(scalar: &Scalar) -> Option<Self> {
                    match scalar {
                        Scalar::Int(i) => <$ty>::try_from(*i).ok(),
                        Scalar::UInt(u) => <$ty>::try_from(*u).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_scalar_int!(i32, i64, u16, u32, u64, usize);

impl FromScalar for f64 {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Scalar::Int(i) => Some(*i as f64),
            #[allow(clippy::cast_precision_loss)]
            Scalar::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }
}

impl FromScalar for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        f64::from_scalar(scalar).map(|f| f as f32)
    }
}

impl FromScalar for Vec<String> {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::List(items) => Some(items.clone()),
            Scalar::Str(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }
}

/// 调用参数或返回值
#[derive(Debug, Clone)]
pub enum Value {
    /// 无值：可选依赖缺失或操作无返回
    Unit,
    /// 标量值
    Scalar(Scalar),
    /// 组件实例
    Instance(Instance),
}

impl Value {
    /// 以标量形式读取
    pub fn as_scalar<T: FromScalar>(&self) -> Option<T> {
        match self {
            Self::Scalar(scalar) => T::from_scalar(scalar),
            _ => None,
        }
    }

    /// 以实例形式读取
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// 是否为无值
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<Option<Instance>> for Value {
    fn from(instance: Option<Instance>) -> Self {
        instance.map_or(Self::Unit, Self::Instance)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::Str(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::Str(value.to_string()))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int(value))
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Unit
    }
}

/// 已解析的调用参数列表
#[derive(Debug, Clone, Default)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    /// 以已解析的值创建参数列表
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// 空参数列表
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 获取第 `index` 个参数
    pub fn get(&self, index: usize) -> anyhow::Result<&Value> {
        self.0
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("参数索引越界: {} (共 {} 个)", index, self.0.len()))
    }

    /// 读取标量参数
    pub fn scalar<T: FromScalar>(&self, index: usize) -> anyhow::Result<T> {
        self.get(index)?.as_scalar::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "参数 {} 不是 {} 类型的标量",
                index,
                std::any::type_name::<T>()
            )
        })
    }

    /// 读取实例参数
    pub fn instance(&self, index: usize) -> anyhow::Result<Instance> {
        self.get(index)?
            .as_instance()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("参数 {} 不是组件实例", index))
    }

    /// 读取具体类型的组件参数
    pub fn component<T: Any + Send + Sync>(&self, index: usize) -> anyhow::Result<Arc<T>> {
        let instance = self.instance(index)?;
        instance.downcast::<T>().ok_or_else(|| {
            if instance.type_key() == &TypeKey::of::<T>() {
                anyhow::anyhow!(
                    "参数 {} 的名义类型为 {}, 但底层对象是包装值; 被拦截的组件需要声明类型化代理",
                    index,
                    instance.type_key()
                )
            } else {
                anyhow::anyhow!(
                    "参数 {} 的类型为 {}, 无法转换为 {}",
                    index,
                    instance.type_key(),
                    std::any::type_name::<T>()
                )
            }
        })
    }

    /// 读取 trait 对象形式的组件参数
    pub fn shared<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> anyhow::Result<Arc<T>> {
        let instance = self.instance(index)?;
        instance.downcast_shared::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "参数 {} 的类型为 {}, 无法视为 {}",
                index,
                instance.type_key(),
                std::any::type_name::<T>()
            )
        })
    }

    /// 读取可选组件参数，缺失时返回 `None`
    pub fn optional_component<T: Any + Send + Sync>(
        &self,
        index: usize,
    ) -> anyhow::Result<Option<Arc<T>>> {
        match self.get(index)? {
            Value::Unit => Ok(None),
            _ => self.component::<T>(index).map(Some),
        }
    }

    /// 读取 trait 对象形式的可选组件参数
    pub fn optional_shared<T: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> anyhow::Result<Option<Arc<T>>> {
        match self.get(index)? {
            Value::Unit => Ok(None),
            _ => self.shared::<T>(index).map(Some),
        }
    }

    /// 按位置遍历参数
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// 取出全部参数
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}
